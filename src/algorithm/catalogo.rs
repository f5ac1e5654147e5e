use crate::excel::normalize_name;
use std::collections::HashMap;

/// Enumeraciones fijas de sedes y escuelas. Sólo las categorías listadas
/// aparecen en los resúmenes, en el orden en que se listan.
#[derive(Debug, Clone)]
pub struct Catalogo {
    sedes: Vec<String>,
    escuelas: Vec<String>,
    idx_sedes: HashMap<String, usize>,
    idx_escuelas: HashMap<String, usize>,
}

impl Catalogo {
    /// Las etiquetas que se repiten tras normalizar se conservan una sola vez.
    pub fn new(sedes: Vec<String>, escuelas: Vec<String>) -> Self {
        let (sedes, idx_sedes) = indexar(sedes);
        let (escuelas, idx_escuelas) = indexar(escuelas);
        Catalogo { sedes, escuelas, idx_sedes, idx_escuelas }
    }

    pub fn sedes(&self) -> &[String] {
        &self.sedes
    }

    pub fn escuelas(&self) -> &[String] {
        &self.escuelas
    }

    /// Posición de la sede en la enumeración (comparación sin acentos ni mayúsculas)
    pub fn posicion_sede(&self, valor: &str) -> Option<usize> {
        self.idx_sedes.get(&normalize_name(valor)).copied()
    }

    pub fn posicion_escuela(&self, valor: &str) -> Option<usize> {
        self.idx_escuelas.get(&normalize_name(valor)).copied()
    }

    /// Etiqueta canónica de la sede, si está listada
    pub fn resolver_sede(&self, valor: &str) -> Option<&str> {
        self.posicion_sede(valor).map(|i| self.sedes[i].as_str())
    }

    pub fn resolver_escuela(&self, valor: &str) -> Option<&str> {
        self.posicion_escuela(valor).map(|i| self.escuelas[i].as_str())
    }
}

fn indexar(valores: Vec<String>) -> (Vec<String>, HashMap<String, usize>) {
    let mut unicos: Vec<String> = Vec::with_capacity(valores.len());
    let mut idx = HashMap::new();
    for v in valores {
        let clave = normalize_name(&v);
        if clave.is_empty() || idx.contains_key(&clave) {
            continue;
        }
        idx.insert(clave, unicos.len());
        unicos.push(v.trim().to_string());
    }
    (unicos, idx)
}
