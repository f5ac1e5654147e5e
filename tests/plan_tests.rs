use std::path::PathBuf;

use avance_encuesta::ResumenesEncuesta;
use avance_encuesta::models::{Agrupacion, ClaveGrupo, FilaResumen, TablaResumen};
use avance_encuesta::presentacion::plan::{AvanceGlobal, PH_TABLA_ESCUELA_EN_SEDE, PH_TABLA_SEDES};
use avance_encuesta::presentacion::plantilla::DiapositivaPlantilla;
use avance_encuesta::presentacion::{
    Contenido, MapaPlantilla, Presentador, PresentadorJson, Resaltado, construir_plan, paginar, resaltar,
};
use tempfile::tempdir;

use Resaltado::{Alto, Bajo, Ninguno};

fn fila(clave: ClaveGrupo, estudiantes: u64, respuestas: u64, porcentaje: f64) -> FilaResumen {
    FilaResumen {
        clave,
        estudiantes,
        respuestas,
        porcentaje,
        n_referencial: None,
        faltantes: None,
        porcentaje_referencial: None,
    }
}

fn tabla_sedes(datos: &[(&str, u64, u64, f64)]) -> TablaResumen {
    TablaResumen {
        agrupacion: Agrupacion::Sede,
        filas: datos
            .iter()
            .map(|(s, e, r, p)| fila(ClaveGrupo::Sede(s.to_string()), *e, *r, *p))
            .collect(),
    }
}

fn tabla_pares(n: usize) -> TablaResumen {
    TablaResumen {
        agrupacion: Agrupacion::EscuelaEnSede,
        filas: (0..n)
            .map(|i| {
                fila(
                    ClaveGrupo::EscuelaEnSede { sede: format!("S{}", i / 5), escuela: format!("E{}", i % 5) },
                    10,
                    i as u64 % 10,
                    (i % 10) as f64 * 10.0,
                )
            })
            .collect(),
    }
}

#[test]
fn test_resaltar_tres_arriba_tres_abajo() {
    let marcas = resaltar(&[50.0, 90.0, 10.0, 70.0, 30.0, 60.0, 80.0, 20.0]);
    assert_eq!(marcas, vec![Ninguno, Alto, Bajo, Alto, Bajo, Ninguno, Alto, Bajo]);
}

#[test]
fn test_resaltar_tablas_cortas() {
    assert!(resaltar(&[]).is_empty());
    assert_eq!(resaltar(&[10.0, 20.0]), vec![Alto, Alto]);
    // con cinco filas la central cae en ambos grupos y queda arriba
    assert_eq!(resaltar(&[1.0, 2.0, 3.0, 4.0, 5.0]), vec![Bajo, Bajo, Alto, Alto, Alto]);
}

#[test]
fn test_resaltar_empates_por_orden() {
    // todo empatado: las mismas tres primeras son arriba y abajo a la vez
    let marcas = resaltar(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    assert_eq!(marcas, vec![Alto, Alto, Alto, Ninguno, Ninguno, Ninguno, Ninguno]);

    let marcas = resaltar(&[5.0, 9.0, 5.0, 1.0, 9.0, 5.0, 5.0]);
    assert_eq!(marcas, vec![Alto, Alto, Bajo, Bajo, Alto, Ninguno, Ninguno]);
}

#[test]
fn test_paginar_de_a_nueve() {
    let tabla = tabla_pares(20);
    let paginas = paginar(&tabla, 9);
    let largos: Vec<usize> = paginas.iter().map(|p| p.filas.len()).collect();
    assert_eq!(largos, vec![9, 9, 2]);
    for p in &paginas {
        assert_eq!(p.encabezados, tabla.encabezados());
        assert_eq!(p.resaltados.len(), p.filas.len());
    }
    assert_eq!(paginas[1].filas[0][0], "S1");
    assert_eq!(paginas[1].filas[0][1], "E4");
    assert_eq!(paginas[0].filas[3][4], "30.00");

    assert!(paginar(&tabla_pares(0), 9).is_empty());
}

#[test]
fn test_avance_global() {
    let sedes = tabla_sedes(&[("Santiago", 10, 4, 40.0), ("Online", 0, 0, 0.0)]);
    let avance = AvanceGlobal::desde(&sedes);
    assert_eq!(avance.estudiantes, 10);
    assert_eq!(avance.respuestas, 4);
    assert_eq!(avance.no_respondidas, 6);
    assert_eq!(avance.porcentaje, 40.0);

    // con conteos fijos las respuestas pueden superar a los estudiantes
    let sedes = tabla_sedes(&[("Online", 3, 5, 166.67)]);
    let avance = AvanceGlobal::desde(&sedes);
    assert_eq!(avance.no_respondidas, 0);
    assert_eq!(avance.porcentaje, 166.67);
}

fn resumenes() -> ResumenesEncuesta {
    ResumenesEncuesta {
        sedes: tabla_sedes(&[("Santiago", 10, 4, 40.0), ("Online", 5, 5, 100.0)]),
        escuelas: TablaResumen {
            agrupacion: Agrupacion::Escuela,
            filas: vec![fila(ClaveGrupo::Escuela("Diseño".to_string()), 15, 9, 60.0)],
        },
        escuela_y_sede: tabla_pares(12),
    }
}

#[test]
fn test_plan_sin_plantilla_ni_graficos() {
    let plan = construir_plan(&resumenes(), None, None, 9);
    let placeholders: Vec<&str> = plan.rellenos.iter().map(|r| r.placeholder.as_str()).collect();
    assert_eq!(
        placeholders,
        vec![
            "tabla_avance_sedes",
            "tabla_avance_escuelas",
            "tabla_resumen_escuela_en_cada_sede",
            "tabla_resumen_escuela_en_cada_sede",
        ]
    );
    assert_eq!(plan.rellenos[3].pagina, 1);
    assert!(plan.placeholders_sin_ubicar.is_empty());
    assert_eq!(plan.avance_global.estudiantes, 15);
    assert_eq!(plan.avance_global.respuestas, 9);
    assert_eq!(plan.avance_global.porcentaje, 60.0);
}

#[test]
fn test_plan_con_plantilla() {
    let mapa = MapaPlantilla {
        ruta: PathBuf::from("plantilla.pptx"),
        diapositivas: vec![
            DiapositivaPlantilla { numero: 2, texto: "tabla_avance_sedes\n".to_string() },
            DiapositivaPlantilla { numero: 5, texto: "tabla_resumen_escuela_en_cada_sede\n".to_string() },
            DiapositivaPlantilla { numero: 6, texto: "tabla_resumen_escuela_en_cada_sede\n".to_string() },
        ],
    };
    let plan = construir_plan(&resumenes(), None, Some(&mapa), 9);

    let sedes = plan.rellenos.iter().find(|r| r.placeholder == PH_TABLA_SEDES).unwrap();
    assert_eq!(sedes.diapositivas, vec![2]);
    match &sedes.contenido {
        Contenido::Tabla(t) => assert_eq!(t.resaltados, vec![Alto, Alto]),
        otro => panic!("se esperaba una tabla: {:?}", otro),
    }

    let paginas: Vec<_> = plan
        .rellenos
        .iter()
        .filter(|r| r.placeholder == PH_TABLA_ESCUELA_EN_SEDE)
        .collect();
    assert_eq!(paginas.len(), 2);
    assert!(paginas.iter().all(|r| r.diapositivas == vec![5]));

    assert!(plan.placeholders_sin_ubicar.contains(&"grafico_avance_global".to_string()));
    assert!(plan.placeholders_sin_ubicar.contains(&"tabla_avance_escuelas".to_string()));
    assert!(!plan.placeholders_sin_ubicar.contains(&"tabla_avance_sedes".to_string()));
}

#[test]
fn test_presentador_json() {
    let dir = tempdir().unwrap();
    let plan = construir_plan(&resumenes(), None, None, 9);
    let presentador = PresentadorJson { destino: dir.path().join("sub/plan.json") };
    let ruta = presentador.presentar(&plan).unwrap();

    let valor: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&ruta).unwrap()).unwrap();
    assert_eq!(valor["avance_global"]["respuestas"], 9);
    assert_eq!(valor["rellenos"][0]["contenido"]["tipo"], "tabla");
    assert_eq!(valor["rellenos"][0]["contenido"]["resaltados"][0], "Alto");
}
