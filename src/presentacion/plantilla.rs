//! Lectura de una plantilla `.pptx` para ubicar los placeholders.
//!
//! Un `.pptx` es un zip; cada diapositiva vive en `ppt/slides/slideN.xml` y
//! su texto visible está en los elementos `<a:t>`. El placeholder se busca
//! como subcadena del texto de la diapositiva.

use anyhow::{Context, Result, anyhow};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct DiapositivaPlantilla {
    /// Número de diapositiva (1-based, según el nombre `slideN.xml`)
    pub numero: usize,
    pub texto: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapaPlantilla {
    pub ruta: PathBuf,
    pub diapositivas: Vec<DiapositivaPlantilla>,
}

impl MapaPlantilla {
    /// Números de las diapositivas cuyo texto contiene `placeholder`
    pub fn diapositivas_con(&self, placeholder: &str) -> Vec<usize> {
        self.diapositivas
            .iter()
            .filter(|d| d.texto.contains(placeholder))
            .map(|d| d.numero)
            .collect()
    }
}

pub fn escanear_plantilla(path: &Path) -> Result<MapaPlantilla> {
    let file = File::open(path)
        .with_context(|| format!("no se pudo abrir la plantilla {}", path.display()))?;
    let diapositivas = escanear_desde(file)
        .with_context(|| format!("plantilla inválida: {}", path.display()))?;
    info!("plantilla {}: {} diapositivas", path.display(), diapositivas.len());
    Ok(MapaPlantilla { ruta: path.to_path_buf(), diapositivas })
}

pub fn escanear_desde<R: Read + Seek>(reader: R) -> Result<Vec<DiapositivaPlantilla>> {
    let mut archive = zip::ZipArchive::new(reader)?;
    let mut slides: Vec<(usize, String)> = archive
        .file_names()
        .filter_map(|n| numero_diapositiva(n).map(|num| (num, n.to_string())))
        .collect();
    slides.sort();

    let mut diapositivas = Vec::with_capacity(slides.len());
    for (numero, nombre) in slides {
        let mut xml = String::new();
        archive.by_name(&nombre)?.read_to_string(&mut xml)?;
        let texto = texto_diapositiva(&xml).with_context(|| format!("XML inválido en {}", nombre))?;
        debug!("diapositiva {}: {:?}", numero, texto);
        diapositivas.push(DiapositivaPlantilla { numero, texto });
    }
    Ok(diapositivas)
}

/// `ppt/slides/slide12.xml` -> Some(12)
fn numero_diapositiva(nombre: &str) -> Option<usize> {
    nombre
        .strip_prefix("ppt/slides/slide")?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

/// Concatena el texto de los `<a:t>`; cada párrafo `<a:p>` termina en '\n'
/// para que un placeholder partido en varios runs siga siendo una subcadena.
pub fn texto_diapositiva(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut texto = String::new();
    let mut dentro_t = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"a:t" => dentro_t = true,
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"a:t" => dentro_t = false,
                b"a:p" => texto.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if dentro_t => {
                let s = t.unescape().map_err(|e| anyhow!("{}", e))?;
                texto.push_str(&s);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(anyhow!(
                    "error de XML en la posición {}: {}",
                    reader.buffer_position(),
                    e
                ));
            }
            _ => {}
        }
    }
    Ok(texto)
}
