//! Tablas auxiliares indexadas por categoría: metas ("N referencial") y
//! conteos de estudiantes por sede/escuela.
//!
//! Ambas pueden venir indexadas por sede, por escuela o por el par
//! (sede, escuela). Una tabla por par sirve también para los resúmenes por
//! sede o por escuela sumando sus filas.

use anyhow::{Result, bail};
use std::path::Path;
use tracing::{info, warn};

use crate::config::Columnas;
use crate::excel::io::{Tabla, leer_tabla, normalize_name, parse_numero};
use crate::models::{Agrupacion, ClaveGrupo, MetaReferencial};

#[derive(Debug, Clone, PartialEq)]
pub struct ConteoCategoria {
    pub sede: Option<String>,
    pub escuela: Option<String>,
    pub estudiantes: u64,
}

#[derive(Debug, Clone, Default)]
pub struct MetasReferenciales {
    pub registros: Vec<MetaReferencial>,
    con_sede: bool,
    con_escuela: bool,
}

impl MetasReferenciales {
    pub fn new(registros: Vec<MetaReferencial>, con_sede: bool, con_escuela: bool) -> Self {
        MetasReferenciales { registros, con_sede, con_escuela }
    }

    pub fn cubre(&self, agrupacion: Agrupacion) -> bool {
        cubre(self.con_sede, self.con_escuela, agrupacion)
    }

    /// Meta para la clave. None si la tabla no cubre esa granularidad;
    /// si la cubre y no hay filas para la clave, la meta es 0.
    pub fn meta(&self, clave: &ClaveGrupo) -> Option<i64> {
        if !self.cubre(clave.agrupacion()) {
            return None;
        }
        Some(
            self.registros
                .iter()
                .filter(|m| coincide(m.sede.as_deref(), m.escuela.as_deref(), clave))
                .fold(0i64, |acc, m| acc.saturating_add(m.n)),
        )
    }

    /// Pares (sede, escuela) presentes en la tabla
    pub fn pares(&self) -> impl Iterator<Item = (&str, &str)> {
        self.registros
            .iter()
            .filter_map(|m| Some((m.sede.as_deref()?, m.escuela.as_deref()?)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConteosCategoria {
    pub registros: Vec<ConteoCategoria>,
    con_sede: bool,
    con_escuela: bool,
}

impl ConteosCategoria {
    pub fn new(registros: Vec<ConteoCategoria>, con_sede: bool, con_escuela: bool) -> Self {
        ConteosCategoria { registros, con_sede, con_escuela }
    }

    pub fn cubre(&self, agrupacion: Agrupacion) -> bool {
        cubre(self.con_sede, self.con_escuela, agrupacion)
    }

    /// Cantidad de estudiantes para la clave; None si la tabla no la trae.
    pub fn estudiantes(&self, clave: &ClaveGrupo) -> Option<u64> {
        if !self.cubre(clave.agrupacion()) {
            return None;
        }
        let mut total: Option<u64> = None;
        for c in self
            .registros
            .iter()
            .filter(|c| coincide(c.sede.as_deref(), c.escuela.as_deref(), clave))
        {
            total = Some(total.unwrap_or(0).saturating_add(c.estudiantes));
        }
        total
    }

    pub fn pares(&self) -> impl Iterator<Item = (&str, &str)> {
        self.registros
            .iter()
            .filter_map(|c| Some((c.sede.as_deref()?, c.escuela.as_deref()?)))
    }
}

pub fn leer_metas(path: &Path, columnas: &Columnas, hoja: Option<&str>) -> Result<MetasReferenciales> {
    let tabla = leer_tabla(path, hoja)?;
    let metas = metas_desde_tabla(&tabla, columnas, &path.display().to_string())?;
    info!("metas {}: {} filas", path.display(), metas.registros.len());
    Ok(metas)
}

pub fn metas_desde_tabla(tabla: &Tabla, columnas: &Columnas, origen: &str) -> Result<MetasReferenciales> {
    let leidos = leer_valores(tabla, columnas, &columnas.n_referencial, origen)?;
    let registros = leidos
        .filas
        .into_iter()
        .map(|(sede, escuela, n)| MetaReferencial { sede, escuela, n: n.round() as i64 })
        .collect();
    Ok(MetasReferenciales::new(registros, leidos.con_sede, leidos.con_escuela))
}

pub fn leer_conteos(path: &Path, columnas: &Columnas, hoja: Option<&str>) -> Result<ConteosCategoria> {
    let tabla = leer_tabla(path, hoja)?;
    let conteos = conteos_desde_tabla(&tabla, columnas, &path.display().to_string())?;
    info!("conteos {}: {} filas", path.display(), conteos.registros.len());
    Ok(conteos)
}

pub fn conteos_desde_tabla(tabla: &Tabla, columnas: &Columnas, origen: &str) -> Result<ConteosCategoria> {
    let leidos = leer_valores(tabla, columnas, &columnas.estudiantes, origen)?;
    let mut registros = Vec::with_capacity(leidos.filas.len());
    for (sede, escuela, n) in leidos.filas {
        if n < 0.0 {
            bail!("{}: conteo negativo de estudiantes ({})", origen, n);
        }
        registros.push(ConteoCategoria { sede, escuela, estudiantes: n.round() as u64 });
    }
    Ok(ConteosCategoria::new(registros, leidos.con_sede, leidos.con_escuela))
}

/// Mayor entero que un f64 representa sin pérdida (2^53)
const MAXIMO_ENTERO: f64 = 9_007_199_254_740_992.0;

struct ValoresLeidos {
    filas: Vec<(Option<String>, Option<String>, f64)>,
    con_sede: bool,
    con_escuela: bool,
}

fn leer_valores(tabla: &Tabla, columnas: &Columnas, col_valor: &str, origen: &str) -> Result<ValoresLeidos> {
    let idx_sede = tabla.indice_columna(&columnas.sede);
    let idx_escuela = tabla.indice_columna(&columnas.escuela);
    if idx_sede.is_none() && idx_escuela.is_none() {
        bail!(
            "{}: se esperaba la columna '{}' o '{}' (encabezados: {:?})",
            origen,
            columnas.sede,
            columnas.escuela,
            tabla.encabezados
        );
    }
    let idx_valor = tabla.columna_requerida(col_valor, origen)?;

    let mut filas = Vec::with_capacity(tabla.len());
    let mut incompletas = 0usize;
    for fila in 0..tabla.len() {
        let sede = idx_sede.map(|i| tabla.celda(fila, i).trim().to_string());
        let escuela = idx_escuela.map(|i| tabla.celda(fila, i).trim().to_string());
        let crudo = tabla.celda(fila, idx_valor);

        let categoria_vacia = sede.as_deref().is_some_and(str::is_empty)
            || escuela.as_deref().is_some_and(str::is_empty);
        if categoria_vacia || crudo.trim().is_empty() {
            incompletas += 1;
            continue;
        }

        let Some(valor) = parse_numero(crudo) else {
            // fila + 2: encabezado en la fila 1 de la planilla
            bail!("{}: valor no numérico '{}' en '{}' (fila {})", origen, crudo, col_valor, fila + 2);
        };
        if valor.abs() > MAXIMO_ENTERO {
            bail!("{}: valor fuera de rango '{}' en '{}' (fila {})", origen, crudo, col_valor, fila + 2);
        }
        filas.push((sede, escuela, valor));
    }

    if incompletas > 0 {
        warn!("{}: {} filas incompletas ignoradas", origen, incompletas);
    }
    Ok(ValoresLeidos {
        filas,
        con_sede: idx_sede.is_some(),
        con_escuela: idx_escuela.is_some(),
    })
}

fn cubre(con_sede: bool, con_escuela: bool, agrupacion: Agrupacion) -> bool {
    match agrupacion {
        Agrupacion::Sede => con_sede,
        Agrupacion::Escuela => con_escuela,
        Agrupacion::EscuelaEnSede => con_sede && con_escuela,
    }
}

fn mismo(a: Option<&str>, b: &str) -> bool {
    a.is_some_and(|a| normalize_name(a) == normalize_name(b))
}

fn coincide(sede: Option<&str>, escuela: Option<&str>, clave: &ClaveGrupo) -> bool {
    match clave {
        ClaveGrupo::Sede(s) => mismo(sede, s),
        ClaveGrupo::Escuela(e) => mismo(escuela, e),
        ClaveGrupo::EscuelaEnSede { sede: s, escuela: e } => mismo(sede, s) && mismo(escuela, e),
    }
}
