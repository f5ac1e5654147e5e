//! Preparación de la presentación.
//!
//! El render del deck queda fuera del crate: aquí se generan los gráficos,
//! se ubican los placeholders de la plantilla y se arma un plan que un
//! `Presentador` entrega al render externo.

pub mod graficos;
pub mod plan;
pub mod plantilla;

pub use graficos::{GraficosGenerados, generar_graficos, grafico_barras, grafico_torta};
pub use plan::{Contenido, PlanPresentacion, Relleno, Resaltado, TablaPresentable, construir_plan, paginar, resaltar};
pub use plantilla::{MapaPlantilla, escanear_plantilla};

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Destino del plan de presentación.
pub trait Presentador {
    /// Entrega el plan y devuelve la ruta del artefacto generado.
    fn presentar(&self, plan: &PlanPresentacion) -> Result<PathBuf>;
}

/// Escribe el plan como JSON para que lo consuma el render externo.
pub struct PresentadorJson {
    pub destino: PathBuf,
}

impl Presentador for PresentadorJson {
    fn presentar(&self, plan: &PlanPresentacion) -> Result<PathBuf> {
        if let Some(dir) = self.destino.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let json = serde_json::to_string_pretty(plan)?;
        fs::write(&self.destino, json)
            .with_context(|| format!("no se pudo escribir {}", self.destino.display()))?;
        info!(
            "plan de presentación guardado en '{}' ({} rellenos)",
            self.destino.display(),
            plan.rellenos.len()
        );
        Ok(self.destino.clone())
    }
}
