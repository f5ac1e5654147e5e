use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};

use crate::algorithm::catalogo::Catalogo;
use crate::config::EstudiantesFijos;
use crate::excel::normalize_name;
use crate::excel::referencial::{ConteosCategoria, MetasReferenciales};
use crate::models::{Agrupacion, AlumnoConciliado, ClaveGrupo, FilaResumen, TablaResumen};

/// Fuentes opcionales que complementan el conteo de la nómina.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpcionesResumen<'a> {
    pub metas: Option<&'a MetasReferenciales>,
    pub conteos: Option<&'a ConteosCategoria>,
    pub estudiantes_fijos: Option<&'a EstudiantesFijos>,
}

/// Redondeo a 2 decimales
pub fn redondear2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// parte / total * 100 redondeado a 2 decimales; 0.0 cuando total es 0.
pub fn porcentaje(parte: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    redondear2(parte as f64 / total as f64 * 100.0)
}

/// Agrupa la nómina conciliada según `agrupacion`.
///
/// Sale una fila por categoría del catálogo y en su orden; las categorías
/// fuera del catálogo se descartan. En `EscuelaEnSede` salen los pares
/// listados que aparecen en la nómina, en los conteos o en las metas.
///
/// Cantidad de estudiantes: nómina → tabla de conteos → conteo fijo de la
/// configuración (el último que exista manda). El porcentaje se calcula
/// después de aplicar esos reemplazos.
pub fn resumir(
    alumnos: &[AlumnoConciliado],
    agrupacion: Agrupacion,
    catalogo: &Catalogo,
    opciones: OpcionesResumen<'_>,
) -> TablaResumen {
    let mut acumulado: HashMap<ClaveGrupo, (u64, u64)> = HashMap::new();
    let mut fuera_de_catalogo: BTreeSet<String> = BTreeSet::new();

    for a in alumnos {
        match clave_de(a, agrupacion, catalogo) {
            Some(clave) => {
                let e = acumulado.entry(clave).or_insert((0, 0));
                e.0 += 1;
                if a.respondio {
                    e.1 += 1;
                }
            }
            None => {
                fuera_de_catalogo.insert(match agrupacion {
                    Agrupacion::Sede => a.sede.clone(),
                    Agrupacion::Escuela => a.escuela.clone(),
                    Agrupacion::EscuelaEnSede => format!("{} / {}", a.sede, a.escuela),
                });
            }
        }
    }

    if !fuera_de_catalogo.is_empty() {
        warn!(
            "resumen por {}: {} categorías fuera del catálogo descartadas: {:?}",
            agrupacion,
            fuera_de_catalogo.len(),
            fuera_de_catalogo
        );
    }

    let claves: Vec<ClaveGrupo> = match agrupacion {
        Agrupacion::Sede => catalogo.sedes().iter().cloned().map(ClaveGrupo::Sede).collect(),
        Agrupacion::Escuela => catalogo.escuelas().iter().cloned().map(ClaveGrupo::Escuela).collect(),
        Agrupacion::EscuelaEnSede => pares_presentes(&acumulado, catalogo, opciones),
    };

    let filas = claves
        .into_iter()
        .map(|clave| {
            let (desde_nomina, respuestas) = acumulado.get(&clave).copied().unwrap_or((0, 0));
            let estudiantes = estudiantes_para(&clave, desde_nomina, opciones);
            fila(clave, estudiantes, respuestas, opciones.metas)
        })
        .collect();

    let tabla = TablaResumen { agrupacion, filas };
    debug!(
        "resumen por {}: {} filas, {} estudiantes, {} respuestas",
        agrupacion,
        tabla.filas.len(),
        tabla.total_estudiantes(),
        tabla.total_respuestas()
    );
    tabla
}

fn clave_de(a: &AlumnoConciliado, agrupacion: Agrupacion, catalogo: &Catalogo) -> Option<ClaveGrupo> {
    match agrupacion {
        Agrupacion::Sede => catalogo.resolver_sede(&a.sede).map(|s| ClaveGrupo::Sede(s.to_string())),
        Agrupacion::Escuela => catalogo
            .resolver_escuela(&a.escuela)
            .map(|e| ClaveGrupo::Escuela(e.to_string())),
        Agrupacion::EscuelaEnSede => {
            let sede = catalogo.resolver_sede(&a.sede)?;
            let escuela = catalogo.resolver_escuela(&a.escuela)?;
            Some(ClaveGrupo::EscuelaEnSede {
                sede: sede.to_string(),
                escuela: escuela.to_string(),
            })
        }
    }
}

fn pares_presentes(
    acumulado: &HashMap<ClaveGrupo, (u64, u64)>,
    catalogo: &Catalogo,
    opciones: OpcionesResumen<'_>,
) -> Vec<ClaveGrupo> {
    let mut posiciones: BTreeSet<(usize, usize)> = BTreeSet::new();
    let mut agregar = |sede: &str, escuela: &str| {
        if let (Some(s), Some(e)) = (catalogo.posicion_sede(sede), catalogo.posicion_escuela(escuela)) {
            posiciones.insert((s, e));
        }
    };

    for clave in acumulado.keys() {
        if let ClaveGrupo::EscuelaEnSede { sede, escuela } = clave {
            agregar(sede, escuela);
        }
    }
    if let Some(conteos) = opciones.conteos {
        for (s, e) in conteos.pares() {
            agregar(s, e);
        }
    }
    if let Some(metas) = opciones.metas {
        for (s, e) in metas.pares() {
            agregar(s, e);
        }
    }

    posiciones
        .into_iter()
        .map(|(s, e)| ClaveGrupo::EscuelaEnSede {
            sede: catalogo.sedes()[s].clone(),
            escuela: catalogo.escuelas()[e].clone(),
        })
        .collect()
}

fn estudiantes_para(clave: &ClaveGrupo, desde_nomina: u64, opciones: OpcionesResumen<'_>) -> u64 {
    let mut estudiantes = desde_nomina;
    if let Some(n) = opciones.conteos.and_then(|c| c.estudiantes(clave)) {
        estudiantes = n;
    }
    if let Some(fijos) = opciones.estudiantes_fijos {
        let fijo = match clave {
            ClaveGrupo::Sede(s) => buscar_fijo(&fijos.sede, s),
            ClaveGrupo::Escuela(e) => buscar_fijo(&fijos.escuela, e),
            ClaveGrupo::EscuelaEnSede { .. } => None,
        };
        if let Some(n) = fijo {
            debug!("{}: conteo fijo {} reemplaza {}", clave, n, estudiantes);
            estudiantes = n;
        }
    }
    estudiantes
}

fn buscar_fijo(mapa: &BTreeMap<String, u64>, etiqueta: &str) -> Option<u64> {
    let buscada = normalize_name(etiqueta);
    mapa.iter()
        .find(|(k, _)| normalize_name(k) == buscada)
        .map(|(_, v)| *v)
}

fn fila(clave: ClaveGrupo, estudiantes: u64, respuestas: u64, metas: Option<&MetasReferenciales>) -> FilaResumen {
    let n_referencial = metas.and_then(|m| m.meta(&clave));
    let faltantes = n_referencial.map(|n| n.saturating_sub(i64::try_from(respuestas).unwrap_or(i64::MAX)));
    let porcentaje_referencial = n_referencial.map(|n| {
        if n <= 0 {
            0.0
        } else {
            porcentaje(respuestas, n as u64)
        }
    });
    FilaResumen {
        clave,
        estudiantes,
        respuestas,
        porcentaje: porcentaje(respuestas, estudiantes),
        n_referencial,
        faltantes,
        porcentaje_referencial,
    }
}
