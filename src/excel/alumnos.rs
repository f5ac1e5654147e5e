use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};

use crate::algorithm::normalizar_identificador;
use crate::config::Columnas;
use crate::excel::io::{Tabla, leer_tabla};
use crate::models::Alumno;

/// Lee la nómina de alumnos desde una planilla o CSV.
pub fn leer_alumnos(path: &Path, columnas: &Columnas, hoja: Option<&str>) -> Result<Vec<Alumno>> {
    let tabla = leer_tabla(path, hoja)?;
    let alumnos = alumnos_desde_tabla(&tabla, columnas, &path.display().to_string())?;
    info!("nómina {}: {} alumnos", path.display(), alumnos.len());
    Ok(alumnos)
}

/// Convierte una tabla en alumnos. Exige las columnas de identificador,
/// sede y escuela; las filas sin identificador se descartan.
pub fn alumnos_desde_tabla(tabla: &Tabla, columnas: &Columnas, origen: &str) -> Result<Vec<Alumno>> {
    let idx_id = tabla.columna_requerida(&columnas.identificador, origen)?;
    let idx_sede = tabla.columna_requerida(&columnas.sede, origen)?;
    let idx_escuela = tabla.columna_requerida(&columnas.escuela, origen)?;

    let mut alumnos = Vec::with_capacity(tabla.len());
    let mut sin_id = 0usize;
    for fila in 0..tabla.len() {
        let id = normalizar_identificador(tabla.celda(fila, idx_id));
        if id.is_empty() {
            sin_id += 1;
            continue;
        }
        alumnos.push(Alumno {
            id,
            sede: tabla.celda(fila, idx_sede).trim().to_string(),
            escuela: tabla.celda(fila, idx_escuela).trim().to_string(),
        });
    }

    if sin_id > 0 {
        warn!("{}: {} filas sin '{}' descartadas", origen, sin_id, columnas.identificador);
    }
    Ok(alumnos)
}
