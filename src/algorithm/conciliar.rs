use std::collections::HashSet;
use tracing::debug;

use crate::algorithm::normalizar::normalizar_identificador;
use crate::models::{Alumno, AlumnoConciliado, Respuesta};

/// Marca cada alumno de la nómina como respondido si su identificador está
/// en el conjunto de respuestas.
///
/// Es una prueba de pertenencia, no un join: los duplicados en cualquiera
/// de los dos lados no generan filas extra ni errores, y se conserva el
/// orden de la nómina. Los identificadores vacíos nunca coinciden.
pub fn marcar_respuestas(alumnos: &[Alumno], respuestas: &[Respuesta]) -> Vec<AlumnoConciliado> {
    let respondidos: HashSet<String> = respuestas
        .iter()
        .map(|r| normalizar_identificador(&r.id))
        .filter(|id| !id.is_empty())
        .collect();

    let conciliados: Vec<AlumnoConciliado> = alumnos
        .iter()
        .map(|a| {
            let id = normalizar_identificador(&a.id);
            let respondio = !id.is_empty() && respondidos.contains(&id);
            AlumnoConciliado {
                id,
                sede: a.sede.clone(),
                escuela: a.escuela.clone(),
                respondio,
            }
        })
        .collect();

    debug!(
        "conciliación: {} alumnos, {} identificadores respondidos, {} coincidencias",
        conciliados.len(),
        respondidos.len(),
        conciliados.iter().filter(|a| a.respondio).count()
    );
    conciliados
}
