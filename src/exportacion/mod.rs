//! Exportación de respuestas de la plataforma de encuestas.
//!
//! La plataforma entrega la exportación como texto base64 de una planilla
//! (`xls`) o de un CSV separado por ';'. Aquí sólo se decodifica ese
//! contenido; la sesión con la plataforma queda fuera de este crate.

use anyhow::{Context, Result, bail};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use crate::excel::{Tabla, leer_csv_bytes, leer_tabla, leer_tabla_desde_bytes};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatoExportacion {
    Csv,
    Xls,
}

impl FromStr for FormatoExportacion {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(FormatoExportacion::Csv),
            "xls" | "xlsx" | "excel" => Ok(FormatoExportacion::Xls),
            otro => bail!("formato de exportación desconocido '{}' (use csv o xls)", otro),
        }
    }
}

impl fmt::Display for FormatoExportacion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatoExportacion::Csv => write!(f, "csv"),
            FormatoExportacion::Xls => write!(f, "xls"),
        }
    }
}

/// Respuesta JSON-RPC guardada tal cual desde la plataforma
#[derive(Debug, Deserialize)]
struct RespuestaRpc {
    result: serde_json::Value,
}

/// Extrae el texto base64. Acepta el base64 pelado o la respuesta JSON-RPC
/// completa (`{"result": "...", ...}`). Un `result` que no es texto suele
/// ser un error de la plataforma (`{"status": "..."}`) y se informa.
fn extraer_base64(payload: &str) -> Result<String> {
    let recortado = payload.trim();
    let texto = if recortado.starts_with('{') {
        let rpc: RespuestaRpc = serde_json::from_str(recortado)
            .context("la respuesta JSON no tiene el campo 'result'")?;
        match rpc.result {
            serde_json::Value::String(s) => s,
            otro => bail!("la plataforma no devolvió datos: {}", otro),
        }
    } else {
        recortado.to_string()
    };
    Ok(texto.chars().filter(|c| !c.is_whitespace()).collect())
}

/// Decodifica una exportación base64 y la devuelve como tabla.
pub fn decodificar_exportacion(payload: &str, formato: FormatoExportacion) -> Result<Tabla> {
    let b64 = extraer_base64(payload)?;
    let bytes = STANDARD
        .decode(b64.as_bytes())
        .context("la exportación no es base64 válido")?;
    debug!("exportación decodificada: {} bytes ({})", bytes.len(), formato);

    let tabla = match formato {
        FormatoExportacion::Csv => leer_csv_bytes(&bytes, Some(b';'))?,
        FormatoExportacion::Xls => leer_tabla_desde_bytes(&bytes, None)?,
    };
    info!("exportación {}: {} filas, {} columnas", formato, tabla.len(), tabla.encabezados.len());
    Ok(tabla)
}

/// Origen de la tabla de respuestas.
pub trait FuenteEncuesta {
    fn obtener(&self) -> Result<Tabla>;
    fn descripcion(&self) -> String;
}

/// Planilla o CSV ya descargado.
pub struct ArchivoEncuesta {
    pub path: PathBuf,
    pub hoja: Option<String>,
}

impl FuenteEncuesta for ArchivoEncuesta {
    fn obtener(&self) -> Result<Tabla> {
        leer_tabla(&self.path, self.hoja.as_deref())
    }

    fn descripcion(&self) -> String {
        self.path.display().to_string()
    }
}

/// Archivo de texto con la exportación en base64 (o la respuesta JSON-RPC).
pub struct ExportacionCodificada {
    pub path: PathBuf,
    pub formato: FormatoExportacion,
}

impl ExportacionCodificada {
    pub fn new(path: &Path, formato: FormatoExportacion) -> Self {
        ExportacionCodificada { path: path.to_path_buf(), formato }
    }
}

impl FuenteEncuesta for ExportacionCodificada {
    fn obtener(&self) -> Result<Tabla> {
        let payload = std::fs::read_to_string(&self.path)
            .with_context(|| format!("no se pudo leer {}", self.path.display()))?;
        decodificar_exportacion(&payload, self.formato)
            .with_context(|| format!("exportación inválida en {}", self.path.display()))
    }

    fn descripcion(&self) -> String {
        format!("{} (base64, {})", self.path.display(), self.formato)
    }
}

/// Elige la fuente según la extensión: `.b64`/`.json` se tratan como
/// exportación codificada, el resto como planilla o CSV.
pub fn fuente_para(path: &Path, formato: FormatoExportacion, hoja: Option<&str>) -> Box<dyn FuenteEncuesta> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "b64" | "json" => Box::new(ExportacionCodificada::new(path, formato)),
        _ => Box::new(ArchivoEncuesta {
            path: path.to_path_buf(),
            hoja: hoja.map(|h| h.to_string()),
        }),
    }
}
