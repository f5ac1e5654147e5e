use std::fs::File;
use std::io::{Cursor, Write};
use tempfile::tempdir;
use zip::write::FileOptions;

use avance_encuesta::presentacion::escanear_plantilla;
use avance_encuesta::presentacion::plantilla::{escanear_desde, texto_diapositiva};

fn diapositiva(parrafos: &[&[&str]]) -> String {
    let mut cuerpo = String::new();
    for runs in parrafos {
        cuerpo.push_str("<a:p>");
        for r in runs.iter() {
            cuerpo.push_str(&format!("<a:r><a:rPr lang=\"es-CL\"/><a:t>{}</a:t></a:r>", r));
        }
        cuerpo.push_str("</a:p>");
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <p:sld xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" \
         xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\">\
         <p:cSld><p:spTree><p:sp><p:txBody>{}</p:txBody></p:sp></p:spTree></p:cSld></p:sld>",
        cuerpo
    )
}

fn pptx<W: Write + std::io::Seek>(destino: W, slides: &[(&str, String)]) {
    let mut zip = zip::ZipWriter::new(destino);
    let opciones = FileOptions::default();
    zip.start_file("[Content_Types].xml", opciones).unwrap();
    zip.write_all(b"<Types/>").unwrap();
    for (nombre, xml) in slides {
        zip.start_file(*nombre, opciones).unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
    }
    zip.start_file("ppt/slides/_rels/slide1.xml.rels", opciones).unwrap();
    zip.write_all(b"<Relationships/>").unwrap();
    zip.finish().unwrap();
}

#[test]
fn test_texto_une_runs_y_desescapa() {
    let xml = diapositiva(&[&["tabla_avance_", "sedes"], &["Avance &amp; metas"]]);
    let texto = texto_diapositiva(&xml).unwrap();
    assert_eq!(texto, "tabla_avance_sedes\nAvance & metas\n");
}

#[test]
fn test_xml_invalido() {
    assert!(texto_diapositiva("<a:p><a:t>abierto</a:p>").is_err());
}

#[test]
fn test_escanea_en_orden_numerico() {
    let mut buf = Cursor::new(Vec::new());
    pptx(
        &mut buf,
        &[
            ("ppt/slides/slide10.xml", diapositiva(&[&["tabla_resumen_escuela_en_cada_sede"]])),
            ("ppt/slides/slide2.xml", diapositiva(&[&["grafico_avance_global"]])),
            ("ppt/slides/slide1.xml", diapositiva(&[&["Portada"]])),
        ],
    );
    buf.set_position(0);

    let diapositivas = escanear_desde(buf).unwrap();
    let numeros: Vec<usize> = diapositivas.iter().map(|d| d.numero).collect();
    assert_eq!(numeros, vec![1, 2, 10]);
    assert_eq!(diapositivas[0].texto, "Portada\n");
}

#[test]
fn test_ubica_placeholders_en_archivo() {
    let dir = tempdir().unwrap();
    let ruta = dir.path().join("plantilla.pptx");
    pptx(
        File::create(&ruta).unwrap(),
        &[
            ("ppt/slides/slide1.xml", diapositiva(&[&["Resultados"], &["grafico_avance_", "global"]])),
            ("ppt/slides/slide2.xml", diapositiva(&[&["tabla_avance_sedes"], &["grafico_avance_sedes"]])),
            ("ppt/slides/slide3.xml", diapositiva(&[&["tabla_avance_sedes"]])),
        ],
    );

    let mapa = escanear_plantilla(&ruta).unwrap();
    assert_eq!(mapa.diapositivas.len(), 3);
    assert_eq!(mapa.diapositivas_con("grafico_avance_global"), vec![1]);
    assert_eq!(mapa.diapositivas_con("tabla_avance_sedes"), vec![2, 3]);
    assert!(mapa.diapositivas_con("tabla_avance_escuelas").is_empty());
}

#[test]
fn test_archivo_que_no_es_pptx() {
    let dir = tempdir().unwrap();
    let ruta = dir.path().join("plantilla.pptx");
    std::fs::write(&ruta, "no soy un zip").unwrap();
    assert!(escanear_plantilla(&ruta).is_err());
}
