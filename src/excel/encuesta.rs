use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};

use crate::algorithm::normalizar_identificador;
use crate::excel::io::{Tabla, leer_tabla};
use crate::models::Respuesta;

/// Lee la exportación de la encuesta desde disco.
pub fn leer_encuesta(path: &Path, col_id: &str, hoja: Option<&str>) -> Result<Vec<Respuesta>> {
    let tabla = leer_tabla(path, hoja)?;
    let respuestas = respuestas_desde_tabla(&tabla, col_id, &path.display().to_string())?;
    info!("encuesta {}: {} respuestas", path.display(), respuestas.len());
    Ok(respuestas)
}

/// Extrae los identificadores normalizados de la tabla de respuestas.
/// Los duplicados se conservan; las filas sin identificador se descartan.
pub fn respuestas_desde_tabla(tabla: &Tabla, col_id: &str, origen: &str) -> Result<Vec<Respuesta>> {
    let idx = tabla.columna_requerida(col_id, origen)?;
    let mut respuestas = Vec::with_capacity(tabla.len());
    let mut vacias = 0usize;
    for fila in 0..tabla.len() {
        let id = normalizar_identificador(tabla.celda(fila, idx));
        if id.is_empty() {
            vacias += 1;
            continue;
        }
        respuestas.push(Respuesta { id });
    }
    if vacias > 0 {
        warn!("{}: {} respuestas sin '{}' ignoradas", origen, vacias, col_id);
    }
    Ok(respuestas)
}

/// Reemplaza en la tabla la columna de identificador por su forma normalizada.
/// Si la columna no existe la tabla queda igual.
pub fn normalizar_columna_identificador(tabla: &mut Tabla, col_id: &str) -> bool {
    let Some(idx) = tabla.indice_columna(col_id) else {
        return false;
    };
    for fila in tabla.filas.iter_mut() {
        if let Some(celda) = fila.get_mut(idx) {
            *celda = normalizar_identificador(celda);
        }
    }
    true
}
