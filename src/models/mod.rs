// Estructuras de datos principales

use serde::Serialize;
use std::fmt;

/// Registro de la nómina de alumnos ya normalizado.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alumno {
    /// Identificador normalizado (parte local del correo, en minúsculas)
    pub id: String,
    pub sede: String,
    pub escuela: String,
}

/// Alumno con la marca de si respondió la encuesta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlumnoConciliado {
    pub id: String,
    pub sede: String,
    pub escuela: String,
    pub respondio: bool,
}

/// Registro de la exportación de la encuesta. Sólo importa el identificador.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Respuesta {
    pub id: String,
}

/// Meta de respuestas ("N referencial"). La tabla de metas puede venir
/// indexada por sede, por escuela o por el par (sede, escuela).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetaReferencial {
    pub sede: Option<String>,
    pub escuela: Option<String>,
    pub n: i64,
}

/// Granularidad de un resumen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Agrupacion {
    Sede,
    Escuela,
    EscuelaEnSede,
}

impl Agrupacion {
    /// Nombre base del archivo de salida para esta granularidad
    pub fn nombre_archivo(&self) -> &'static str {
        match self {
            Agrupacion::Sede => "resumen_sedes",
            Agrupacion::Escuela => "resumen_escuelas",
            Agrupacion::EscuelaEnSede => "resumen_escuela_y_sede",
        }
    }

    /// Columnas de categoría que encabezan la tabla
    pub fn columnas_categoria(&self) -> &'static [&'static str] {
        match self {
            Agrupacion::Sede => &[COL_SEDE],
            Agrupacion::Escuela => &[COL_ESCUELA],
            Agrupacion::EscuelaEnSede => &[COL_SEDE, COL_ESCUELA],
        }
    }
}

impl fmt::Display for Agrupacion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Agrupacion::Sede => write!(f, "sede"),
            Agrupacion::Escuela => write!(f, "escuela"),
            Agrupacion::EscuelaEnSede => write!(f, "escuela en sede"),
        }
    }
}

/// Clave de una fila de resumen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum ClaveGrupo {
    Sede(String),
    Escuela(String),
    EscuelaEnSede { sede: String, escuela: String },
}

impl ClaveGrupo {
    pub fn agrupacion(&self) -> Agrupacion {
        match self {
            ClaveGrupo::Sede(_) => Agrupacion::Sede,
            ClaveGrupo::Escuela(_) => Agrupacion::Escuela,
            ClaveGrupo::EscuelaEnSede { .. } => Agrupacion::EscuelaEnSede,
        }
    }

    /// Etiquetas en el orden de `Agrupacion::columnas_categoria`
    pub fn etiquetas(&self) -> Vec<&str> {
        match self {
            ClaveGrupo::Sede(s) => vec![s.as_str()],
            ClaveGrupo::Escuela(e) => vec![e.as_str()],
            ClaveGrupo::EscuelaEnSede { sede, escuela } => vec![sede.as_str(), escuela.as_str()],
        }
    }
}

impl fmt::Display for ClaveGrupo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.etiquetas().join(" / "))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilaResumen {
    pub clave: ClaveGrupo,
    pub estudiantes: u64,
    pub respuestas: u64,
    /// respuestas / estudiantes * 100, redondeado a 2 decimales (0.0 si no hay estudiantes)
    pub porcentaje: f64,
    pub n_referencial: Option<i64>,
    /// n_referencial - respuestas; puede ser negativo
    pub faltantes: Option<i64>,
    pub porcentaje_referencial: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TablaResumen {
    pub agrupacion: Agrupacion,
    pub filas: Vec<FilaResumen>,
}

impl TablaResumen {
    /// true si alguna fila trae meta referencial (define si se escriben esas columnas)
    pub fn tiene_referencial(&self) -> bool {
        self.filas.iter().any(|f| f.n_referencial.is_some())
    }

    pub fn total_estudiantes(&self) -> u64 {
        self.filas.iter().map(|f| f.estudiantes).sum()
    }

    pub fn total_respuestas(&self) -> u64 {
        self.filas.iter().map(|f| f.respuestas).sum()
    }

    /// Encabezados de la tabla tal como se escriben y presentan
    pub fn encabezados(&self) -> Vec<String> {
        let mut cols: Vec<String> = self
            .agrupacion
            .columnas_categoria()
            .iter()
            .map(|c| c.to_string())
            .collect();
        cols.push(COL_ESTUDIANTES.to_string());
        cols.push(COL_RESPUESTAS.to_string());
        cols.push(COL_PORCENTAJE.to_string());
        if self.tiene_referencial() {
            cols.push(COL_N_REFERENCIAL.to_string());
            cols.push(COL_FALTANTES.to_string());
            cols.push(COL_PORCENTAJE_REFERENCIAL.to_string());
        }
        cols
    }
}

pub const COL_SEDE: &str = "SEDE";
pub const COL_ESCUELA: &str = "ESCUELA";
pub const COL_ESTUDIANTES: &str = "Cantidad de estudiantes";
pub const COL_RESPUESTAS: &str = "Cantidad de respuestas";
pub const COL_PORCENTAJE: &str = "% de avance respecto a total";
pub const COL_N_REFERENCIAL: &str = "N referencial";
pub const COL_FALTANTES: &str = "Faltantes para N referencial";
pub const COL_PORCENTAJE_REFERENCIAL: &str = "% de avance respecto a N referencial";
