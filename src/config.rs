//! Configuración de una corrida: nombres de columnas, enumeraciones fijas de
//! sedes/escuelas y conteos fijos que reemplazan a los de la nómina.
//!
//! Orden de resolución: ruta explícita (`--config`) → variable de entorno
//! `ENCUESTA_CONFIG` → valores por defecto. Se carga `.env` si existe.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::algorithm::Catalogo;

pub const ENV_CONFIG: &str = "ENCUESTA_CONFIG";
pub const ENV_DATAFILES_DIR: &str = "ENCUESTA_DATAFILES_DIR";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Columnas {
    pub identificador: String,
    pub sede: String,
    pub escuela: String,
    pub n_referencial: String,
    pub estudiantes: String,
}

impl Default for Columnas {
    fn default() -> Self {
        Columnas {
            identificador: "EMAIL".to_string(),
            sede: "SEDE".to_string(),
            escuela: "ESCUELA".to_string(),
            n_referencial: "N referencial".to_string(),
            estudiantes: "Cantidad de estudiantes".to_string(),
        }
    }
}

/// Conteos de estudiantes que se imponen sobre los calculados.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EstudiantesFijos {
    pub sede: BTreeMap<String, u64>,
    pub escuela: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FormatoSalida {
    #[default]
    Xlsx,
    Csv,
}

impl FormatoSalida {
    pub fn extension(&self) -> &'static str {
        match self {
            FormatoSalida::Xlsx => "xlsx",
            FormatoSalida::Csv => "csv",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConfigEncuesta {
    pub columnas: Columnas,
    pub sedes: Vec<String>,
    pub escuelas: Vec<String>,
    pub estudiantes_fijos: EstudiantesFijos,
    /// Hoja a leer en las planillas de entrada (None = primera hoja)
    pub hoja: Option<String>,
    pub max_filas_por_diapositiva: usize,
    pub formato_salida: FormatoSalida,
}

impl Default for ConfigEncuesta {
    fn default() -> Self {
        ConfigEncuesta {
            columnas: Columnas::default(),
            sedes: [
                "Santiago",
                "Viña del Mar",
                "Concepción",
                "Online",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            escuelas: [
                "Administración y Negocios",
                "Comunicación",
                "Construcción",
                "Diseño",
                "Educación",
                "Informática y Telecomunicaciones",
                "Ingeniería",
                "Salud",
                "Turismo y Hospitalidad",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            estudiantes_fijos: EstudiantesFijos::default(),
            hoja: None,
            max_filas_por_diapositiva: 9,
            formato_salida: FormatoSalida::Xlsx,
        }
    }
}

impl ConfigEncuesta {
    /// Carga la configuración. Una ruta indicada (explícita o por entorno)
    /// que no existe es un error; sin ruta se usan los valores por defecto.
    pub fn cargar(ruta: Option<&Path>) -> Result<Self> {
        let _ = dotenv::dotenv();

        let ruta: Option<PathBuf> = match ruta {
            Some(r) => Some(r.to_path_buf()),
            None => env::var(ENV_CONFIG).ok().map(PathBuf::from),
        };

        let cfg = match ruta {
            Some(r) => {
                info!("cargando configuración desde {}", r.display());
                Self::load_from_file(&r)?
            }
            None => {
                info!("sin archivo de configuración; usando valores por defecto");
                ConfigEncuesta::default()
            }
        };
        cfg.validar()?;
        Ok(cfg)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("no se pudo leer la configuración {}", path.display()))?;
        let cfg: ConfigEncuesta = serde_json::from_str(&content)
            .with_context(|| format!("configuración inválida en {}", path.display()))?;
        Ok(cfg)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("no se pudo escribir {}", path.display()))?;
        Ok(())
    }

    pub fn validar(&self) -> Result<()> {
        if self.sedes.is_empty() {
            bail!("la configuración no lista ninguna sede");
        }
        if self.escuelas.is_empty() {
            bail!("la configuración no lista ninguna escuela");
        }
        if self.max_filas_por_diapositiva == 0 {
            bail!("max_filas_por_diapositiva debe ser mayor que 0");
        }
        Ok(())
    }

    pub fn catalogo(&self) -> Catalogo {
        Catalogo::new(self.sedes.clone(), self.escuelas.clone())
    }
}
