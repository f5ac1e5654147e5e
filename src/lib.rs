// Biblioteca raíz del crate `avance_encuesta`.
// Reexporta los módulos principales y la función `procesar_encuesta` que
// orquesta una corrida completa.
pub mod algorithm;
pub mod config;
pub mod excel;
pub mod exportacion;
pub mod models;
pub mod presentacion;

pub use algorithm::{Entradas, ResultadoProceso, ResumenesEncuesta, calcular_resumenes, procesar_encuesta};
pub use config::ConfigEncuesta;
