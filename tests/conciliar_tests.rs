use avance_encuesta::algorithm::marcar_respuestas;
use avance_encuesta::models::{Alumno, Respuesta};

fn alumno(id: &str, sede: &str, escuela: &str) -> Alumno {
    Alumno { id: id.to_string(), sede: sede.to_string(), escuela: escuela.to_string() }
}

fn respuesta(id: &str) -> Respuesta {
    Respuesta { id: id.to_string() }
}

#[test]
fn test_marca_por_pertenencia() {
    let alumnos = vec![
        alumno("ana", "Santiago", "Diseño"),
        alumno("beto", "Santiago", "Diseño"),
        alumno("carla", "Concepción", "Salud"),
    ];
    let respuestas = vec![respuesta("carla"), respuesta("ana"), respuesta("desconocido")];

    let conciliados = marcar_respuestas(&alumnos, &respuestas);
    let marcas: Vec<(&str, bool)> = conciliados.iter().map(|a| (a.id.as_str(), a.respondio)).collect();
    assert_eq!(marcas, vec![("ana", true), ("beto", false), ("carla", true)]);
}

#[test]
fn test_normaliza_ambos_lados() {
    // aunque lleguen sin normalizar, se comparan con la misma regla
    let alumnos = vec![alumno("Ana@alumnos.cl", "Santiago", "Diseño")];
    let respuestas = vec![respuesta("ANA@gmail.com")];
    let conciliados = marcar_respuestas(&alumnos, &respuestas);
    assert_eq!(conciliados[0].id, "ana");
    assert!(conciliados[0].respondio);
}

#[test]
fn test_tolera_duplicados() {
    let alumnos = vec![
        alumno("ana", "Santiago", "Diseño"),
        alumno("ana", "Santiago", "Diseño"),
        alumno("beto", "Santiago", "Diseño"),
    ];
    let respuestas = vec![respuesta("ana"), respuesta("ana"), respuesta("ana")];

    let conciliados = marcar_respuestas(&alumnos, &respuestas);
    assert_eq!(conciliados.len(), 3);
    assert_eq!(conciliados.iter().filter(|a| a.respondio).count(), 2);
}

#[test]
fn test_identificador_vacio_nunca_coincide() {
    let alumnos = vec![alumno("", "Santiago", "Diseño")];
    let respuestas = vec![respuesta(""), respuesta("@x.cl")];
    let conciliados = marcar_respuestas(&alumnos, &respuestas);
    assert!(!conciliados[0].respondio);
}

#[test]
fn test_todo_respondido_queda_marcado() {
    let alumnos: Vec<Alumno> = (0..50).map(|i| alumno(&format!("u{}", i), "Santiago", "Diseño")).collect();
    let respuestas: Vec<Respuesta> = (0..50)
        .filter(|i| i % 3 == 0)
        .map(|i| respuesta(&format!("U{}@X.CL", i)))
        .collect();

    let conciliados = marcar_respuestas(&alumnos, &respuestas);
    for (i, a) in conciliados.iter().enumerate() {
        assert_eq!(a.respondio, i % 3 == 0, "alumno {}", a.id);
    }
}
