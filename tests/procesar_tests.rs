use base64::{Engine as _, engine::general_purpose::STANDARD};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

use avance_encuesta::config::FormatoSalida;
use avance_encuesta::exportacion::FormatoExportacion;
use avance_encuesta::{ConfigEncuesta, Entradas, procesar_encuesta};

const NOMINA: &str = "\
EMAIL,SEDE,ESCUELA
ana@alumnos.cl,Santiago,Diseño
beto@alumnos.cl,Santiago,Diseño
carla@alumnos.cl,Santiago,Salud
dani@alumnos.cl,Online,Salud
eli@alumnos.cl,Online,Salud
fran@alumnos.cl,Antofagasta,Diseño
";

const ENCUESTA: &str = "\
EMAIL;P1
ANA@gmail.com;Sí
carla@alumnos.cl;No
carla@alumnos.cl;No
dani;Sí
externo@otro.cl;Sí
";

const METAS: &str = "\
SEDE,N referencial
Santiago,2
Online,5
";

fn config() -> ConfigEncuesta {
    let mut cfg = ConfigEncuesta::default();
    cfg.sedes = vec!["Santiago".to_string(), "Concepción".to_string(), "Online".to_string()];
    cfg.escuelas = vec!["Diseño".to_string(), "Salud".to_string()];
    cfg.formato_salida = FormatoSalida::Csv;
    cfg
}

fn preparar(dir: &Path) -> Entradas {
    fs::write(dir.join("nomina.csv"), NOMINA).unwrap();
    fs::write(dir.join("encuesta.csv"), ENCUESTA).unwrap();
    fs::write(dir.join("metas.csv"), METAS).unwrap();
    Entradas {
        alumnos: dir.join("nomina.csv"),
        encuesta: dir.join("encuesta.csv"),
        formato_encuesta: FormatoExportacion::Csv,
        referencial: Some(dir.join("metas.csv")),
        conteos: None,
        plantilla: None,
    }
}

fn leer(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_corrida_completa_en_csv() {
    let dir = tempdir().unwrap();
    let entradas = preparar(dir.path());
    let salida = dir.path().join("salida");

    let r = procesar_encuesta(&entradas, &salida, &config(), false).unwrap();
    assert_eq!(r.alumnos, 6);
    assert_eq!(r.respuestas, 5);
    assert_eq!(r.archivos.len(), 3);
    assert!(r.plan.is_file());

    let sedes = leer(&salida.join("resumen_sedes.csv"));
    let lineas: Vec<&str> = sedes.lines().collect();
    assert_eq!(lineas.len(), 4);
    assert_eq!(lineas[1], "Santiago,3,2,66.67,2,0,100.00");
    assert_eq!(lineas[2], "Concepción,0,0,0.00,0,0,0.00");
    assert_eq!(lineas[3], "Online,2,1,50.00,5,4,20.00");

    let escuelas = leer(&salida.join("resumen_escuelas.csv"));
    let lineas: Vec<&str> = escuelas.lines().collect();
    assert_eq!(
        lineas[0],
        "ESCUELA,Cantidad de estudiantes,Cantidad de respuestas,% de avance respecto a total"
    );
    // Antofagasta no está listada pero su alumno sí cuenta en la escuela
    assert_eq!(lineas[1], "Diseño,3,1,33.33");
    assert_eq!(lineas[2], "Salud,3,2,66.67");

    let pares = leer(&salida.join("resumen_escuela_y_sede.csv"));
    let lineas: Vec<&str> = pares.lines().skip(1).collect();
    assert_eq!(lineas, vec!["Santiago,Diseño,2,1,50.00", "Santiago,Salud,1,1,100.00", "Online,Salud,2,1,50.00"]);

    let plan: serde_json::Value = serde_json::from_str(&leer(&r.plan)).unwrap();
    assert_eq!(plan["avance_global"]["estudiantes"], 5);
    assert_eq!(plan["avance_global"]["respuestas"], 3);
    assert_eq!(plan["avance_global"]["porcentaje"], 60.0);
}

#[test]
fn test_corridas_repetidas_dan_los_mismos_archivos() {
    let dir = tempdir().unwrap();
    let entradas = preparar(dir.path());

    for formato in [FormatoSalida::Csv, FormatoSalida::Xlsx] {
        let mut cfg = config();
        cfg.formato_salida = formato;
        let ext = formato.extension();

        let a = procesar_encuesta(&entradas, &dir.path().join(format!("a_{}", ext)), &cfg, false).unwrap();
        // el xlsx guarda fecha con resolución de segundos
        std::thread::sleep(std::time::Duration::from_millis(1100));
        let b = procesar_encuesta(&entradas, &dir.path().join(format!("b_{}", ext)), &cfg, false).unwrap();

        assert_eq!(a.resumenes, b.resumenes);
        assert_eq!(a.archivos.len(), 3);
        for (x, y) in a.archivos.iter().zip(&b.archivos) {
            assert_eq!(x.extension().unwrap(), ext);
            assert_eq!(fs::read(x).unwrap(), fs::read(y).unwrap(), "{}", x.display());
        }
    }
}

#[test]
fn test_encuesta_codificada_y_salida_xlsx() {
    let dir = tempdir().unwrap();
    let mut entradas = preparar(dir.path());
    let codificada = dir.path().join("exportacion.json");
    let rpc = serde_json::json!({ "jsonrpc": "2.0", "result": STANDARD.encode(ENCUESTA) });
    fs::write(&codificada, rpc.to_string()).unwrap();
    entradas.encuesta = codificada;
    entradas.referencial = None;

    let mut cfg = config();
    cfg.formato_salida = FormatoSalida::Xlsx;
    let salida = dir.path().join("salida");
    let r = procesar_encuesta(&entradas, &salida, &cfg, false).unwrap();

    assert_eq!(r.respuestas, 5);
    assert!(salida.join("resumen_sedes.xlsx").is_file());
    assert!(!r.resumenes.sedes.tiene_referencial());
    assert_eq!(r.resumenes.sedes.filas[0].respuestas, 2);
}

#[test]
fn test_nomina_sin_columna_de_sede() {
    let dir = tempdir().unwrap();
    let entradas = preparar(dir.path());
    fs::write(&entradas.alumnos, "EMAIL,ESCUELA\nana,Diseño\n").unwrap();

    let err = procesar_encuesta(&entradas, &dir.path().join("salida"), &config(), false).unwrap_err();
    assert!(err.to_string().contains("SEDE"), "{}", err);
}
