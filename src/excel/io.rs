use anyhow::{Context, Result, anyhow};
use calamine::{Data, Reader, Sheets, open_workbook_auto, open_workbook_auto_from_rs};
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use tracing::debug;

/// Tabla genérica con columnas nombradas, tal como sale de una planilla o CSV.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tabla {
    pub encabezados: Vec<String>,
    pub filas: Vec<Vec<String>>,
}

impl Tabla {
    /// Primera fila = encabezados. Las filas completamente vacías se descartan.
    pub fn desde_filas(mut filas: Vec<Vec<String>>) -> Self {
        if filas.is_empty() {
            return Tabla::default();
        }
        let encabezados: Vec<String> = filas
            .remove(0)
            .into_iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        let filas = filas
            .into_iter()
            .filter(|r| r.iter().any(|c| !c.trim().is_empty()))
            .collect();
        Tabla { encabezados, filas }
    }

    /// Índice de la columna cuyo encabezado coincide con `nombre`
    /// ignorando mayúsculas y espacios.
    pub fn indice_columna(&self, nombre: &str) -> Option<usize> {
        let buscado = normalize_header(nombre);
        self.encabezados.iter().position(|h| normalize_header(h) == buscado)
    }

    /// Igual que `indice_columna` pero falla con un mensaje que nombra la columna.
    pub fn columna_requerida(&self, nombre: &str, origen: &str) -> Result<usize> {
        self.indice_columna(nombre).ok_or_else(|| {
            anyhow!(
                "columna '{}' no encontrada en {} (encabezados: {:?})",
                nombre,
                origen,
                self.encabezados
            )
        })
    }

    /// Valor de la celda (fila, col); cadena vacía si la fila es más corta.
    pub fn celda(&self, fila: usize, col: usize) -> &str {
        self.filas
            .get(fila)
            .and_then(|r| r.get(col))
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.filas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filas.is_empty()
    }
}

/// Convierte un `Data` de calamine a String (versión genérica para celdas)
pub fn cell_to_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if (f.floor() - f).abs() < f64::EPSILON {
                format!("{}", *f as i64)
            } else {
                format!("{}", f)
            }
        }
        Data::Int(i) => format!("{}", i),
        Data::Bool(b) => format!("{}", b),
        Data::Empty => String::new(),
        Data::Error(_) => String::new(),
        Data::DateTime(s) => s.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Normaliza encabezados eliminando espacios y pasando a minúsculas.
pub fn normalize_header(s: &str) -> String {
    s.to_lowercase().chars().filter(|c| !c.is_whitespace()).collect()
}

/// Normaliza un nombre human-readable: minusculas, elimina acentos, convierte
/// puntuación a espacios y colapsa espacios múltiples.
pub fn normalize_name(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        let c = match ch {
            'Á' | 'À' | 'Ä' | 'Â' | 'Ã' | 'á' | 'à' | 'ä' | 'â' | 'ã' => 'a',
            'É' | 'È' | 'Ë' | 'Ê' | 'é' | 'è' | 'ë' | 'ê' => 'e',
            'Í' | 'Ì' | 'Ï' | 'Î' | 'í' | 'ì' | 'ï' | 'î' => 'i',
            'Ó' | 'Ò' | 'Ö' | 'Ô' | 'Õ' | 'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
            'Ú' | 'Ù' | 'Ü' | 'Û' | 'ú' | 'ù' | 'ü' | 'û' => 'u',
            'Ñ' | 'ñ' => 'n',
            'Ç' | 'ç' => 'c',
            other => other,
        };
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else {
            out.push(' ');
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parsea un número escrito en una celda ("12", "12.0", "12,5", "1 234",
/// "1.234", "1.234,5"). Un punto seguido de grupos de exactamente tres
/// dígitos es separador de miles. `inf`, `NaN` y similares no son números.
pub fn parse_numero(s: &str) -> Option<f64> {
    let mut limpio: String = s.trim().chars().filter(|c| !c.is_whitespace()).collect();
    if limpio.is_empty() {
        return None;
    }
    if punto_de_miles(&limpio) {
        limpio.retain(|c| c != '.');
    }
    limpio
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// "1.234", "-12.345.678" o "1.234,5": la parte entera agrupada de a tres.
fn punto_de_miles(s: &str) -> bool {
    let entera = s.split(',').next().unwrap_or("");
    let entera = entera.trim_start_matches(['-', '+']);
    let grupos: Vec<&str> = entera.split('.').collect();
    let digitos = |g: &str| g.chars().all(|c| c.is_ascii_digit());
    grupos.len() >= 2
        && (1..=3).contains(&grupos[0].len())
        && digitos(grupos[0])
        && grupos[1..].iter().all(|&g| g.len() == 3 && digitos(g))
}

/// Lee una tabla desde disco. `.csv`/`.txt` se leen con el crate `csv`
/// (delimitador detectado); el resto se abre con calamine.
pub fn leer_tabla<P: AsRef<Path>>(path: P, hoja: Option<&str>) -> Result<Tabla> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let tabla = if ext == "csv" || ext == "txt" {
        let bytes = std::fs::read(path)
            .with_context(|| format!("no se pudo leer {}", path.display()))?;
        leer_csv_bytes(&bytes, None)
            .with_context(|| format!("CSV inválido: {}", path.display()))?
    } else {
        let workbook = open_workbook_auto(path)
            .with_context(|| format!("no se pudo abrir la planilla {}", path.display()))?;
        Tabla::desde_filas(leer_hoja(workbook, hoja.unwrap_or(""))?)
    };

    debug!(
        "leída tabla {}: {} columnas, {} filas",
        path.display(),
        tabla.encabezados.len(),
        tabla.len()
    );
    Ok(tabla)
}

/// Lee una planilla (xls/xlsx/ods) desde bytes en memoria.
pub fn leer_tabla_desde_bytes(bytes: &[u8], hoja: Option<&str>) -> Result<Tabla> {
    let workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .context("los bytes no corresponden a una planilla legible")?;
    Ok(Tabla::desde_filas(leer_hoja(workbook, hoja.unwrap_or(""))?))
}

/// Lee un CSV desde bytes. Si `delimitador` es None se elige entre ';' y ','
/// según cuál aparece más en la primera línea.
pub fn leer_csv_bytes(bytes: &[u8], delimitador: Option<u8>) -> Result<Tabla> {
    let delim = delimitador.unwrap_or_else(|| detectar_delimitador(bytes));
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delim)
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut filas: Vec<Vec<String>> = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        filas.push(rec.iter().map(|c| c.trim().to_string()).collect());
    }
    Ok(Tabla::desde_filas(filas))
}

fn detectar_delimitador(bytes: &[u8]) -> u8 {
    let primera = bytes.split(|b| *b == b'\n').next().unwrap_or(&[]);
    let pc = primera.iter().filter(|b| **b == b';').count();
    let c = primera.iter().filter(|b| **b == b',').count();
    if pc > c { b';' } else { b',' }
}

/// Devuelve la hoja pedida como filas de texto; si no existe, la primera.
fn leer_hoja<RS: Read + Seek>(mut workbook: Sheets<RS>, sheet_name: &str) -> Result<Vec<Vec<String>>> {
    let names = workbook.sheet_names().to_owned();
    let sheet_to_use = if sheet_name.is_empty() {
        names.first().cloned().unwrap_or_default()
    } else {
        names
            .iter()
            .find(|s| *s == sheet_name)
            .cloned()
            .unwrap_or_else(|| names.first().cloned().unwrap_or_default())
    };

    if sheet_to_use.is_empty() {
        return Ok(Vec::new());
    }

    let range = workbook
        .worksheet_range(&sheet_to_use)
        .map_err(|e| anyhow!("no se pudo leer la hoja '{}': {}", sheet_to_use, e))?;
    Ok(range
        .rows()
        .map(|r| r.iter().map(cell_to_string).collect())
        .collect())
}
