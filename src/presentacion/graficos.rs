//! Gráficos PNG para la presentación (plotters, backend de mapa de bits).

use anyhow::{Result, anyhow};
use plotters::element::Pie;
use plotters::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::algorithm::ResumenesEncuesta;
use crate::models::TablaResumen;
use crate::presentacion::plan::{AvanceGlobal, PH_GRAFICO_ESCUELAS, PH_GRAFICO_GLOBAL, PH_GRAFICO_SEDES};

const NEGRO: RGBColor = RGBColor(0, 0, 0);
const AMARILLO: RGBColor = RGBColor(0xF8, 0xB4, 0x16);
const AZUL: RGBColor = RGBColor(65, 105, 225);

#[derive(Debug, Clone, PartialEq)]
pub struct GraficosGenerados {
    pub global: PathBuf,
    pub sedes: PathBuf,
    pub escuelas: PathBuf,
}

fn error_dibujo<E: std::fmt::Display>(e: E) -> anyhow::Error {
    anyhow!("error al dibujar: {}", e)
}

/// Etiquetas de la torta: "Encuestas respondidas: n (p%)". Con total 0 se
/// muestra 0 (0%).
pub fn etiquetas_torta(avance: &AvanceGlobal) -> [String; 2] {
    let total = avance.respuestas + avance.no_respondidas;
    let etiqueta = |base: &str, n: u64| {
        if total == 0 {
            format!("{}: 0 (0%)", base)
        } else {
            format!("{}: {} ({:.2}%)", base, n, n as f64 / total as f64 * 100.0)
        }
    };
    [
        etiqueta("Encuestas respondidas", avance.respuestas),
        etiqueta("Encuestas no respondidas", avance.no_respondidas),
    ]
}

/// Torta de respondidas vs no respondidas.
pub fn grafico_torta(avance: &AvanceGlobal, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, (800, 800)).into_drawing_area();
    root.fill(&WHITE).map_err(error_dibujo)?;

    let etiquetas = etiquetas_torta(avance);
    if avance.respuestas + avance.no_respondidas == 0 {
        let estilo = ("sans-serif", 28.0).into_font().color(&NEGRO);
        root.draw(&Text::new(etiquetas[0].clone(), (200, 380), estilo.clone()))
            .map_err(error_dibujo)?;
        root.draw(&Text::new(etiquetas[1].clone(), (200, 420), estilo))
            .map_err(error_dibujo)?;
    } else {
        let dims = root.dim_in_pixel();
        let center = (dims.0 as i32 / 2, dims.1 as i32 / 2);
        let radius = 260.0;
        let sizes = vec![avance.respuestas as f64, avance.no_respondidas as f64];
        let colors = vec![NEGRO, AMARILLO];
        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &etiquetas);
        pie.start_angle(-90.0);
        pie.label_style(("sans-serif", 22.0).into_font().color(&NEGRO));
        root.draw(&pie).map_err(error_dibujo)?;
    }

    root.present().map_err(error_dibujo)?;
    Ok(())
}

/// Barras con el porcentaje de avance de cada fila; eje Y de 0 a 100.
pub fn grafico_barras(tabla: &TablaResumen, path: &Path, font_size: f64) -> Result<()> {
    let root = BitMapBackend::new(path, (1200, 800)).into_drawing_area();
    root.fill(&WHITE).map_err(error_dibujo)?;

    let etiquetas: Vec<String> = tabla.filas.iter().map(|f| f.clave.to_string()).collect();
    let n = etiquetas.len().max(1) as u32;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .x_label_area_size(220)
        .y_label_area_size(60)
        .build_cartesian_2d((0u32..n).into_segmented(), 0f64..100f64)
        .map_err(error_dibujo)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .y_labels(11)
        .y_label_formatter(&|v| format!("{:.0}%", v))
        .x_labels(etiquetas.len().max(1))
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => etiquetas.get(*i as usize).cloned().unwrap_or_default(),
            _ => String::new(),
        })
        .x_label_style(
            ("sans-serif", font_size)
                .into_font()
                .transform(FontTransform::Rotate90),
        )
        .draw()
        .map_err(error_dibujo)?;

    chart
        .draw_series(
            Histogram::vertical(&chart)
                .style(AZUL.filled())
                .margin(20)
                .data(
                    tabla
                        .filas
                        .iter()
                        .enumerate()
                        .map(|(i, f)| (i as u32, f.porcentaje.clamp(0.0, 100.0))),
                ),
        )
        .map_err(error_dibujo)?;

    root.present().map_err(error_dibujo)?;
    Ok(())
}

/// Genera los tres gráficos en `dir` con el nombre de su placeholder.
pub fn generar_graficos(resumenes: &ResumenesEncuesta, dir: &Path) -> Result<GraficosGenerados> {
    fs::create_dir_all(dir)?;
    let graficos = GraficosGenerados {
        global: dir.join(format!("{}.png", PH_GRAFICO_GLOBAL)),
        sedes: dir.join(format!("{}.png", PH_GRAFICO_SEDES)),
        escuelas: dir.join(format!("{}.png", PH_GRAFICO_ESCUELAS)),
    };

    grafico_torta(&AvanceGlobal::desde(&resumenes.sedes), &graficos.global)?;
    grafico_barras(&resumenes.sedes, &graficos.sedes, 20.0)?;
    grafico_barras(&resumenes.escuelas, &graficos.escuelas, 16.0)?;

    info!("gráficos guardados en {}", dir.display());
    Ok(graficos)
}
