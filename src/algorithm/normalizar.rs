/// Normaliza un identificador (normalmente un correo): recorta espacios,
/// toma lo anterior a la primera '@' y lo pasa a minúsculas.
///
/// Es la única función de normalización; la usan tanto la nómina como la
/// encuesta. Aplicarla dos veces no cambia el resultado.
pub fn normalizar_identificador(raw: &str) -> String {
    let recortado = raw.trim();
    let local = match recortado.find('@') {
        Some(pos) => &recortado[..pos],
        None => recortado,
    };
    local.trim().to_lowercase()
}
