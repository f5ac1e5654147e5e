use anyhow::{Context, Result, bail};
use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, Workbook};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::excel::io::Tabla;
use crate::models::TablaResumen;

/// Valor tipado de una celda de salida.
#[derive(Debug, Clone, PartialEq)]
pub enum Celda {
    Texto(String),
    Entero(i64),
    Decimal(f64),
    Vacia,
}

impl Celda {
    /// Representación de texto usada en CSV y en la presentación
    pub fn texto(&self) -> String {
        match self {
            Celda::Texto(s) => s.clone(),
            Celda::Entero(i) => i.to_string(),
            Celda::Decimal(f) => format!("{:.2}", f),
            Celda::Vacia => String::new(),
        }
    }
}

/// Filas de una tabla de resumen alineadas con `TablaResumen::encabezados`.
pub fn filas_resumen(tabla: &TablaResumen) -> Vec<Vec<Celda>> {
    let con_referencial = tabla.tiene_referencial();
    tabla
        .filas
        .iter()
        .map(|f| {
            let mut fila: Vec<Celda> = f
                .clave
                .etiquetas()
                .into_iter()
                .map(|e| Celda::Texto(e.to_string()))
                .collect();
            fila.push(Celda::Entero(f.estudiantes as i64));
            fila.push(Celda::Entero(f.respuestas as i64));
            fila.push(Celda::Decimal(f.porcentaje));
            if con_referencial {
                fila.push(f.n_referencial.map(Celda::Entero).unwrap_or(Celda::Vacia));
                fila.push(f.faltantes.map(Celda::Entero).unwrap_or(Celda::Vacia));
                fila.push(f.porcentaje_referencial.map(Celda::Decimal).unwrap_or(Celda::Vacia));
            }
            fila
        })
        .collect()
}

/// Escribe un resumen en `.xlsx` o `.csv` según la extensión de `path`.
pub fn escribir_resumen(tabla: &TablaResumen, path: &Path) -> Result<()> {
    escribir(&tabla.encabezados(), &filas_resumen(tabla), path)?;
    info!("resumen por {} guardado en '{}'", tabla.agrupacion, path.display());
    Ok(())
}

/// Escribe una tabla genérica (todas las celdas como texto).
pub fn escribir_tabla(tabla: &Tabla, path: &Path) -> Result<()> {
    let filas: Vec<Vec<Celda>> = tabla
        .filas
        .iter()
        .map(|r| r.iter().map(|c| Celda::Texto(c.clone())).collect())
        .collect();
    escribir(&tabla.encabezados, &filas, path)?;
    info!("tabla de {} filas guardada en '{}'", tabla.len(), path.display());
    Ok(())
}

fn escribir(encabezados: &[String], filas: &[Vec<Celda>], path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "xlsx" => escribir_xlsx(encabezados, filas, path),
        "csv" => escribir_csv(encabezados, filas, path),
        otro => bail!("formato de salida no soportado '{}' ({})", otro, path.display()),
    }
}

fn escribir_csv(encabezados: &[String], filas: &[Vec<Celda>], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("no se pudo crear {}", path.display()))?;
    wtr.write_record(encabezados)?;
    for fila in filas {
        wtr.write_record(fila.iter().map(Celda::texto))?;
    }
    wtr.flush()?;
    Ok(())
}

fn escribir_xlsx(encabezados: &[String], filas: &[Vec<Celda>], path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    // fecha fija en docProps/core.xml: misma entrada, mismos bytes
    let creado = ExcelDateTime::from_ymd(2000, 1, 1)?;
    workbook.set_properties(&DocProperties::new().set_creation_datetime(&creado));
    let bold = Format::new().set_bold();
    let dos_decimales = Format::new().set_num_format("0.00");

    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Resumen")?;

    for (j, h) in encabezados.iter().enumerate() {
        let col = j as u16;
        worksheet.write_string_with_format(0, col, h, &bold)?;
        worksheet.set_column_width(col, (h.chars().count().max(10) + 2) as f64)?;
    }

    for (i, fila) in filas.iter().enumerate() {
        let row = (i + 1) as u32;
        for (j, celda) in fila.iter().enumerate() {
            let col = j as u16;
            match celda {
                Celda::Texto(s) => {
                    worksheet.write_string(row, col, s)?;
                }
                Celda::Entero(n) => {
                    worksheet.write_number(row, col, *n as f64)?;
                }
                Celda::Decimal(f) => {
                    worksheet.write_number_with_format(row, col, *f, &dos_decimales)?;
                }
                Celda::Vacia => {}
            }
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("no se pudo guardar {}", path.display()))?;
    Ok(())
}
