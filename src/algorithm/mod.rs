//! Conciliación y agregación.
//!
//! Flujo de `procesar_encuesta`:
//! 1. leer nómina y respuestas (identificadores normalizados)
//! 2. marcar respondidos por pertenencia al conjunto de respuestas
//! 3. resumir por sede, por escuela y por escuela en cada sede
//! 4. escribir resúmenes, gráficos y plan de presentación

pub mod catalogo;
pub mod conciliar;
pub mod normalizar;
pub mod resumen;

pub use catalogo::Catalogo;
pub use conciliar::marcar_respuestas;
pub use normalizar::normalizar_identificador;
pub use resumen::{OpcionesResumen, porcentaje, resumir};

use anyhow::Result;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::ConfigEncuesta;
use crate::excel::{
    ConteosCategoria, MetasReferenciales, escribir_resumen, leer_alumnos, leer_conteos, leer_metas,
    respuestas_desde_tabla,
};
use crate::exportacion::{FormatoExportacion, fuente_para};
use crate::models::{Agrupacion, Alumno, Respuesta, TablaResumen};
use crate::presentacion::{Presentador, PresentadorJson, construir_plan, escanear_plantilla, generar_graficos};

/// Los tres resúmenes de una corrida.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumenesEncuesta {
    pub sedes: TablaResumen,
    pub escuelas: TablaResumen,
    pub escuela_y_sede: TablaResumen,
}

impl ResumenesEncuesta {
    pub fn tablas(&self) -> [&TablaResumen; 3] {
        [&self.sedes, &self.escuelas, &self.escuela_y_sede]
    }
}

/// Concilia y resume sin tocar disco.
pub fn calcular_resumenes(
    alumnos: &[Alumno],
    respuestas: &[Respuesta],
    metas: Option<&MetasReferenciales>,
    conteos: Option<&ConteosCategoria>,
    cfg: &ConfigEncuesta,
) -> ResumenesEncuesta {
    let conciliados = marcar_respuestas(alumnos, respuestas);
    let catalogo = cfg.catalogo();
    let opciones = OpcionesResumen {
        metas,
        conteos,
        estudiantes_fijos: Some(&cfg.estudiantes_fijos),
    };

    ResumenesEncuesta {
        sedes: resumir(&conciliados, Agrupacion::Sede, &catalogo, opciones),
        escuelas: resumir(&conciliados, Agrupacion::Escuela, &catalogo, opciones),
        escuela_y_sede: resumir(&conciliados, Agrupacion::EscuelaEnSede, &catalogo, opciones),
    }
}

/// Archivos de entrada de una corrida.
#[derive(Debug, Clone)]
pub struct Entradas {
    pub alumnos: PathBuf,
    pub encuesta: PathBuf,
    /// Formato de la encuesta cuando viene codificada en base64
    pub formato_encuesta: FormatoExportacion,
    pub referencial: Option<PathBuf>,
    pub conteos: Option<PathBuf>,
    pub plantilla: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ResultadoProceso {
    pub resumenes: ResumenesEncuesta,
    pub alumnos: usize,
    pub respuestas: usize,
    pub archivos: Vec<PathBuf>,
    pub plan: PathBuf,
}

pub const NOMBRE_PLAN: &str = "plan_presentacion.json";

/// Corrida completa: lee entradas, resume y escribe todo en `salida`.
pub fn procesar_encuesta(
    entradas: &Entradas,
    salida: &Path,
    cfg: &ConfigEncuesta,
    con_graficos: bool,
) -> Result<ResultadoProceso> {
    fs::create_dir_all(salida)?;
    let hoja = cfg.hoja.as_deref();

    let alumnos = leer_alumnos(&entradas.alumnos, &cfg.columnas, hoja)?;

    let fuente = fuente_para(&entradas.encuesta, entradas.formato_encuesta, hoja);
    let tabla_encuesta = fuente.obtener()?;
    let respuestas =
        respuestas_desde_tabla(&tabla_encuesta, &cfg.columnas.identificador, &fuente.descripcion())?;
    info!("encuesta {}: {} respuestas", fuente.descripcion(), respuestas.len());

    let metas = match &entradas.referencial {
        Some(p) => Some(leer_metas(p, &cfg.columnas, hoja)?),
        None => None,
    };
    let conteos = match &entradas.conteos {
        Some(p) => Some(leer_conteos(p, &cfg.columnas, hoja)?),
        None => None,
    };

    let resumenes = calcular_resumenes(&alumnos, &respuestas, metas.as_ref(), conteos.as_ref(), cfg);

    let mut archivos = Vec::new();
    for tabla in resumenes.tablas() {
        let path = salida.join(format!(
            "{}.{}",
            tabla.agrupacion.nombre_archivo(),
            cfg.formato_salida.extension()
        ));
        escribir_resumen(tabla, &path)?;
        archivos.push(path);
    }

    let graficos = if con_graficos {
        let g = generar_graficos(&resumenes, salida)?;
        archivos.extend([g.global.clone(), g.sedes.clone(), g.escuelas.clone()]);
        Some(g)
    } else {
        None
    };

    let plantilla = match &entradas.plantilla {
        Some(p) => Some(escanear_plantilla(p)?),
        None => None,
    };

    let plan = construir_plan(
        &resumenes,
        graficos.as_ref(),
        plantilla.as_ref(),
        cfg.max_filas_por_diapositiva,
    );
    let presentador = PresentadorJson { destino: salida.join(NOMBRE_PLAN) };
    let plan_path = presentador.presentar(&plan)?;

    Ok(ResultadoProceso {
        resumenes,
        alumnos: alumnos.len(),
        respuestas: respuestas.len(),
        archivos,
        plan: plan_path,
    })
}
