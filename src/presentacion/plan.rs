use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::PathBuf;
use tracing::warn;

use crate::algorithm::ResumenesEncuesta;
use crate::algorithm::resumen::porcentaje;
use crate::excel::filas_resumen;
use crate::models::TablaResumen;
use crate::presentacion::graficos::GraficosGenerados;
use crate::presentacion::plantilla::MapaPlantilla;

pub const PH_GRAFICO_GLOBAL: &str = "grafico_avance_global";
pub const PH_TABLA_SEDES: &str = "tabla_avance_sedes";
pub const PH_GRAFICO_SEDES: &str = "grafico_avance_sedes";
pub const PH_TABLA_ESCUELAS: &str = "tabla_avance_escuelas";
pub const PH_GRAFICO_ESCUELAS: &str = "grafico_avance_escuelas";
pub const PH_TABLA_ESCUELA_EN_SEDE: &str = "tabla_resumen_escuela_en_cada_sede";

pub const PLACEHOLDERS: &[&str] = &[
    PH_GRAFICO_GLOBAL,
    PH_TABLA_SEDES,
    PH_GRAFICO_SEDES,
    PH_TABLA_ESCUELAS,
    PH_GRAFICO_ESCUELAS,
    PH_TABLA_ESCUELA_EN_SEDE,
];

/// Cuántas filas se marcan arriba y abajo en cada tabla
const N_RESALTADOS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Resaltado {
    Alto,
    Bajo,
    Ninguno,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TablaPresentable {
    pub encabezados: Vec<String>,
    pub filas: Vec<Vec<String>>,
    /// Marca por fila según "% de avance respecto a total"
    pub resaltados: Vec<Resaltado>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "tipo", rename_all = "lowercase")]
pub enum Contenido {
    Tabla(TablaPresentable),
    Imagen { ruta: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relleno {
    pub placeholder: String,
    /// Diapositivas de la plantilla (1-based) que contienen el placeholder
    pub diapositivas: Vec<usize>,
    /// Página de una tabla repartida en varias diapositivas (0 si cabe en una)
    pub pagina: usize,
    pub contenido: Contenido,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AvanceGlobal {
    pub estudiantes: u64,
    pub respuestas: u64,
    pub no_respondidas: u64,
    pub porcentaje: f64,
}

impl AvanceGlobal {
    /// Totales de la tabla por sede. Las no respondidas nunca son negativas.
    pub fn desde(sedes: &TablaResumen) -> Self {
        let estudiantes = sedes.total_estudiantes();
        let respuestas = sedes.total_respuestas();
        AvanceGlobal {
            estudiantes,
            respuestas,
            no_respondidas: estudiantes.saturating_sub(respuestas),
            porcentaje: porcentaje(respuestas, estudiantes),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanPresentacion {
    pub generado_en: DateTime<Local>,
    pub plantilla: Option<PathBuf>,
    pub avance_global: AvanceGlobal,
    pub rellenos: Vec<Relleno>,
    pub placeholders_sin_ubicar: Vec<String>,
}

/// Marca las `N_RESALTADOS` filas con mayor porcentaje como `Alto` y las de
/// menor como `Bajo`. Si una fila cae en ambos grupos queda `Alto`; los
/// empates se resuelven por orden de aparición.
pub fn resaltar(porcentajes: &[f64]) -> Vec<Resaltado> {
    let mut orden: Vec<usize> = (0..porcentajes.len()).collect();
    orden.sort_by(|&a, &b| porcentajes[b].total_cmp(&porcentajes[a]).then(a.cmp(&b)));
    let altos: Vec<usize> = orden.iter().copied().take(N_RESALTADOS).collect();

    orden.sort_by(|&a, &b| porcentajes[a].total_cmp(&porcentajes[b]).then(a.cmp(&b)));
    let bajos: Vec<usize> = orden.iter().copied().take(N_RESALTADOS).collect();

    (0..porcentajes.len())
        .map(|i| {
            if altos.contains(&i) {
                Resaltado::Alto
            } else if bajos.contains(&i) {
                Resaltado::Bajo
            } else {
                Resaltado::Ninguno
            }
        })
        .collect()
}

pub fn tabla_presentable(tabla: &TablaResumen) -> TablaPresentable {
    paginar(tabla, usize::MAX).into_iter().next().unwrap_or_else(|| TablaPresentable {
        encabezados: tabla.encabezados(),
        filas: Vec::new(),
        resaltados: Vec::new(),
    })
}

/// Reparte la tabla en páginas de a lo más `max_filas` filas. El resaltado
/// se calcula dentro de cada página.
pub fn paginar(tabla: &TablaResumen, max_filas: usize) -> Vec<TablaPresentable> {
    let encabezados = tabla.encabezados();
    let celdas = filas_resumen(tabla);
    let max_filas = max_filas.max(1);

    celdas
        .chunks(max_filas)
        .zip(tabla.filas.chunks(max_filas))
        .map(|(pagina, filas)| {
            let porcentajes: Vec<f64> = filas.iter().map(|f| f.porcentaje).collect();
            TablaPresentable {
                encabezados: encabezados.clone(),
                filas: pagina
                    .iter()
                    .map(|r| r.iter().map(|c| c.texto()).collect())
                    .collect(),
                resaltados: resaltar(&porcentajes),
            }
        })
        .collect()
}

/// Arma el plan: qué placeholder recibe qué tabla o imagen.
pub fn construir_plan(
    resumenes: &ResumenesEncuesta,
    graficos: Option<&GraficosGenerados>,
    plantilla: Option<&MapaPlantilla>,
    max_filas_por_diapositiva: usize,
) -> PlanPresentacion {
    let ubicar = |ph: &str| -> Vec<usize> {
        plantilla.map(|p| p.diapositivas_con(ph)).unwrap_or_default()
    };

    let mut rellenos: Vec<Relleno> = Vec::new();
    let imagen = |ph: &str, ruta: Option<&PathBuf>, rellenos: &mut Vec<Relleno>| {
        if let Some(ruta) = ruta {
            rellenos.push(Relleno {
                placeholder: ph.to_string(),
                diapositivas: ubicar(ph),
                pagina: 0,
                contenido: Contenido::Imagen { ruta: ruta.clone() },
            });
        }
    };

    imagen(PH_GRAFICO_GLOBAL, graficos.map(|g| &g.global), &mut rellenos);
    rellenos.push(Relleno {
        placeholder: PH_TABLA_SEDES.to_string(),
        diapositivas: ubicar(PH_TABLA_SEDES),
        pagina: 0,
        contenido: Contenido::Tabla(tabla_presentable(&resumenes.sedes)),
    });
    imagen(PH_GRAFICO_SEDES, graficos.map(|g| &g.sedes), &mut rellenos);
    rellenos.push(Relleno {
        placeholder: PH_TABLA_ESCUELAS.to_string(),
        diapositivas: ubicar(PH_TABLA_ESCUELAS),
        pagina: 0,
        contenido: Contenido::Tabla(tabla_presentable(&resumenes.escuelas)),
    });
    imagen(PH_GRAFICO_ESCUELAS, graficos.map(|g| &g.escuelas), &mut rellenos);

    // la tabla larga usa sólo la primera diapositiva que la contiene como molde
    let molde: Vec<usize> = ubicar(PH_TABLA_ESCUELA_EN_SEDE).into_iter().take(1).collect();
    for (i, pagina) in paginar(&resumenes.escuela_y_sede, max_filas_por_diapositiva)
        .into_iter()
        .enumerate()
    {
        rellenos.push(Relleno {
            placeholder: PH_TABLA_ESCUELA_EN_SEDE.to_string(),
            diapositivas: molde.clone(),
            pagina: i,
            contenido: Contenido::Tabla(pagina),
        });
    }

    let placeholders_sin_ubicar: Vec<String> = match plantilla {
        Some(p) => PLACEHOLDERS
            .iter()
            .filter(|ph| p.diapositivas_con(ph).is_empty())
            .map(|ph| ph.to_string())
            .collect(),
        None => Vec::new(),
    };
    if !placeholders_sin_ubicar.is_empty() {
        warn!("placeholders ausentes en la plantilla: {:?}", placeholders_sin_ubicar);
    }

    PlanPresentacion {
        generado_en: Local::now(),
        plantilla: plantilla.map(|p| p.ruta.clone()),
        avance_global: AvanceGlobal::desde(&resumenes.sedes),
        rellenos,
        placeholders_sin_ubicar,
    }
}
