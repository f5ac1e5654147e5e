// --- Avance de encuesta por sede y escuela - Archivo principal ---

use anyhow::{Context, Result, anyhow, bail};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use avance_encuesta::config::ConfigEncuesta;
use avance_encuesta::excel::{
    self, KEYWORDS_ALUMNOS, KEYWORDS_ENCUESTA, escribir_tabla, get_datafiles_dir, latest_file_matching,
    normalizar_columna_identificador, resolver_archivo,
};
use avance_encuesta::exportacion::{FormatoExportacion, decodificar_exportacion};
use avance_encuesta::models::TablaResumen;
use avance_encuesta::presentacion::escanear_plantilla;
use avance_encuesta::presentacion::plan::PLACEHOLDERS;
use avance_encuesta::{Entradas, procesar_encuesta};

fn cli() -> Command {
    let archivo = |nombre: &'static str, ayuda: &'static str| {
        Arg::new(nombre)
            .long(nombre)
            .value_name("FILE")
            .help(ayuda)
            .value_parser(value_parser!(PathBuf))
    };

    Command::new("avance_encuesta")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Concilia respuestas de encuesta con la nómina y resume el avance por sede y escuela")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Archivo de configuración JSON (por defecto $ENCUESTA_CONFIG)")
                .global(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .subcommand(
            Command::new("procesar")
                .about("Corrida completa: resúmenes, gráficos y plan de presentación")
                .arg(archivo("alumnos", "Nómina de alumnos (se busca en datafiles si se omite)"))
                .arg(archivo("encuesta", "Exportación de la encuesta: planilla, CSV o base64 (.b64/.json)"))
                .arg(archivo("referencial", "Tabla de metas (N referencial)"))
                .arg(archivo("conteos", "Tabla de cantidad de estudiantes por categoría"))
                .arg(archivo("plantilla", "Plantilla .pptx con placeholders"))
                .arg(
                    Arg::new("formato")
                        .long("formato")
                        .value_name("csv|xls")
                        .help("Formato de la exportación cuando viene en base64")
                        .default_value("xls"),
                )
                .arg(
                    Arg::new("salida")
                        .short('o')
                        .long("salida")
                        .value_name("DIR")
                        .default_value("salida")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("sin-graficos")
                        .long("sin-graficos")
                        .help("No generar los PNG")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("decodificar")
                .about("Decodifica una exportación base64 y la guarda como planilla o CSV")
                .arg(archivo("entrada", "Archivo con el base64 o la respuesta JSON-RPC").required(true))
                .arg(
                    Arg::new("formato")
                        .long("formato")
                        .value_name("csv|xls")
                        .default_value("xls"),
                )
                .arg(
                    Arg::new("salida")
                        .short('o')
                        .long("salida")
                        .value_name("FILE")
                        .default_value("encuesta_completa.xlsx")
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("plantilla")
                .about("Lista en qué diapositivas aparece cada placeholder")
                .arg(archivo("ruta", "Plantilla .pptx").required(true)),
        )
        .subcommand(
            Command::new("init-config")
                .about("Escribe la configuración por defecto")
                .arg(
                    Arg::new("ruta")
                        .long("ruta")
                        .value_name("FILE")
                        .default_value("encuesta.json")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("forzar")
                        .long("forzar")
                        .help("Sobrescribir si ya existe")
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env).with_target(false).init();

    let matches = cli().get_matches();
    let config_path = matches.get_one::<PathBuf>("config").cloned();

    match matches.subcommand() {
        Some(("procesar", m)) => cmd_procesar(m, config_path.as_deref()),
        Some(("decodificar", m)) => cmd_decodificar(m, config_path.as_deref()),
        Some(("plantilla", m)) => cmd_plantilla(m),
        Some(("init-config", m)) => cmd_init_config(m),
        _ => Err(anyhow!("subcomando desconocido")),
    }
}

/// Archivo indicado (resuelto contra datafiles) o el más reciente que
/// coincida con las palabras clave.
fn entrada_requerida(m: &ArgMatches, nombre: &str, keywords: &[&str]) -> Result<PathBuf> {
    if let Some(p) = m.get_one::<PathBuf>(nombre) {
        return resolver_archivo(p);
    }
    let dir = get_datafiles_dir();
    let encontrado = latest_file_matching(&dir, keywords).ok_or_else(|| {
        anyhow!(
            "no se indicó --{} y no hay archivos que coincidan con {:?} en {}",
            nombre,
            keywords,
            dir.display()
        )
    })?;
    info!("--{} no indicado; usando {}", nombre, encontrado.display());
    Ok(encontrado)
}

fn entrada_opcional(m: &ArgMatches, nombre: &str) -> Result<Option<PathBuf>> {
    m.get_one::<PathBuf>(nombre).map(|p| resolver_archivo(p)).transpose()
}

fn formato(m: &ArgMatches) -> Result<FormatoExportacion> {
    m.get_one::<String>("formato")
        .map(|s| s.as_str())
        .unwrap_or("xls")
        .parse()
}

fn cmd_procesar(m: &ArgMatches, config_path: Option<&Path>) -> Result<()> {
    let cfg = ConfigEncuesta::cargar(config_path)?;

    let entradas = Entradas {
        alumnos: entrada_requerida(m, "alumnos", KEYWORDS_ALUMNOS)?,
        encuesta: entrada_requerida(m, "encuesta", KEYWORDS_ENCUESTA)?,
        formato_encuesta: formato(m)?,
        referencial: entrada_opcional(m, "referencial")?,
        conteos: entrada_opcional(m, "conteos")?,
        plantilla: m.get_one::<PathBuf>("plantilla").cloned(),
    };
    let salida = m
        .get_one::<PathBuf>("salida")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("salida"));

    let resultado = procesar_encuesta(&entradas, &salida, &cfg, !m.get_flag("sin-graficos"))?;

    println!("=== Avance de encuesta ===");
    println!("Alumnos en nómina: {}", resultado.alumnos);
    println!("Respuestas leídas: {}", resultado.respuestas);
    println!();
    imprimir_tabla(&resultado.resumenes.sedes);
    println!();
    imprimir_tabla(&resultado.resumenes.escuelas);
    println!();
    println!("Archivos generados:");
    for p in resultado.archivos.iter().chain(std::iter::once(&resultado.plan)) {
        println!("  {}", p.display());
    }
    Ok(())
}

fn imprimir_tabla(tabla: &TablaResumen) {
    println!("{}", tabla.encabezados().join(" | "));
    for fila in excel::filas_resumen(tabla) {
        let celdas: Vec<String> = fila.iter().map(|c| c.texto()).collect();
        println!("{}", celdas.join(" | "));
    }
}

fn cmd_decodificar(m: &ArgMatches, config_path: Option<&Path>) -> Result<()> {
    let cfg = ConfigEncuesta::cargar(config_path)?;
    let entrada = m
        .get_one::<PathBuf>("entrada")
        .ok_or_else(|| anyhow!("falta --entrada"))?;
    let salida = m
        .get_one::<PathBuf>("salida")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("encuesta_completa.xlsx"));

    let payload = std::fs::read_to_string(entrada)
        .with_context(|| format!("no se pudo leer {}", entrada.display()))?;
    let mut tabla = decodificar_exportacion(&payload, formato(m)?)?;
    if !normalizar_columna_identificador(&mut tabla, &cfg.columnas.identificador) {
        warn!(
            "la exportación no trae la columna '{}'; se guarda sin normalizar",
            cfg.columnas.identificador
        );
    }
    escribir_tabla(&tabla, &salida)?;
    println!("Archivo {} generado con éxito ({} filas)", salida.display(), tabla.len());
    Ok(())
}

fn cmd_plantilla(m: &ArgMatches) -> Result<()> {
    let ruta = m
        .get_one::<PathBuf>("ruta")
        .ok_or_else(|| anyhow!("falta --ruta"))?;
    let mapa = escanear_plantilla(ruta)?;
    println!("Plantilla {} ({} diapositivas)", ruta.display(), mapa.diapositivas.len());
    for ph in PLACEHOLDERS {
        let diapositivas = mapa.diapositivas_con(ph);
        if diapositivas.is_empty() {
            println!("  {:<40} (no encontrado)", ph);
        } else {
            let nums: Vec<String> = diapositivas.iter().map(|n| n.to_string()).collect();
            println!("  {:<40} diapositivas {}", ph, nums.join(", "));
        }
    }
    Ok(())
}

fn cmd_init_config(m: &ArgMatches) -> Result<()> {
    let ruta = m
        .get_one::<PathBuf>("ruta")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("encuesta.json"));
    if ruta.exists() && !m.get_flag("forzar") {
        bail!("{} ya existe (use --forzar para sobrescribir)", ruta.display());
    }
    ConfigEncuesta::default().save_to_file(&ruta)?;
    println!("Configuración por defecto escrita en {}", ruta.display());
    println!("Edite las listas 'sedes' y 'escuelas' antes de procesar.");
    Ok(())
}
