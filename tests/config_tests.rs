use std::fs;
use tempfile::tempdir;

use avance_encuesta::config::{ConfigEncuesta, FormatoSalida};
use avance_encuesta::presentacion::graficos::etiquetas_torta;
use avance_encuesta::presentacion::plan::AvanceGlobal;

#[test]
fn test_guardar_y_cargar() {
    let dir = tempdir().unwrap();
    let ruta = dir.path().join("conf/encuesta.json");

    let mut cfg = ConfigEncuesta::default();
    cfg.estudiantes_fijos.sede.insert("Online".to_string(), 1200);
    cfg.formato_salida = FormatoSalida::Csv;
    cfg.save_to_file(&ruta).unwrap();

    let leida = ConfigEncuesta::cargar(Some(&ruta)).unwrap();
    assert_eq!(leida, cfg);
    assert!(fs::read_to_string(&ruta).unwrap().contains("\"formato_salida\": \"csv\""));
}

#[test]
fn test_campos_omitidos_toman_valores_por_defecto() {
    let dir = tempdir().unwrap();
    let ruta = dir.path().join("encuesta.json");
    fs::write(&ruta, r#"{ "sedes": ["Santiago"], "columnas": { "identificador": "Correo" } }"#).unwrap();

    let cfg = ConfigEncuesta::load_from_file(&ruta).unwrap();
    assert_eq!(cfg.sedes, vec!["Santiago"]);
    assert_eq!(cfg.columnas.identificador, "Correo");
    assert_eq!(cfg.columnas.sede, "SEDE");
    assert_eq!(cfg.escuelas, ConfigEncuesta::default().escuelas);
    assert_eq!(cfg.max_filas_por_diapositiva, 9);
}

#[test]
fn test_configuracion_invalida() {
    let dir = tempdir().unwrap();
    let ruta = dir.path().join("encuesta.json");

    fs::write(&ruta, r#"{ "sedes": [] }"#).unwrap();
    assert!(ConfigEncuesta::cargar(Some(&ruta)).is_err());

    fs::write(&ruta, r#"{ "max_filas_por_diapositiva": 0 }"#).unwrap();
    assert!(ConfigEncuesta::cargar(Some(&ruta)).is_err());

    fs::write(&ruta, "{ no es json").unwrap();
    assert!(ConfigEncuesta::load_from_file(&ruta).is_err());

    assert!(ConfigEncuesta::cargar(Some(&dir.path().join("no_existe.json"))).is_err());
}

#[test]
fn test_catalogo_desde_configuracion() {
    let mut cfg = ConfigEncuesta::default();
    cfg.sedes = vec!["Santiago".to_string(), "SANTIAGO ".to_string(), "Online".to_string()];
    let catalogo = cfg.catalogo();
    assert_eq!(catalogo.sedes(), ["Santiago", "Online"]);
    assert_eq!(catalogo.resolver_sede("online"), Some("Online"));
    assert_eq!(catalogo.resolver_escuela("informatica y telecomunicaciones"), Some("Informática y Telecomunicaciones"));
    assert_eq!(catalogo.resolver_sede("Antofagasta"), None);
}

#[test]
fn test_etiquetas_de_la_torta() {
    let avance = AvanceGlobal { estudiantes: 8, respuestas: 2, no_respondidas: 6, porcentaje: 25.0 };
    let [resp, no_resp] = etiquetas_torta(&avance);
    assert_eq!(resp, "Encuestas respondidas: 2 (25.00%)");
    assert_eq!(no_resp, "Encuestas no respondidas: 6 (75.00%)");

    let vacio = AvanceGlobal { estudiantes: 0, respuestas: 0, no_respondidas: 0, porcentaje: 0.0 };
    assert_eq!(etiquetas_torta(&vacio)[0], "Encuestas respondidas: 0 (0%)");
}
