/// Format file size in human-readable format
///
/// # Arguments
/// * `bytes` - Size in bytes
///
/// # Returns
/// * Human-readable size string (e.g., "1.2 MB", "512 B")
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Percentage saved, rounded to the nearest integer: `round(100 - 100 / input * output)`.
///
/// The operand order is kept as is so the rounding matches previously
/// reported figures exactly.
pub fn percent_saved(input_size: u64, output_size: u64) -> i64 {
    if input_size == 0 {
        return 0;
    }
    (100.0 - 100.0 / input_size as f64 * output_size as f64).round() as i64
}
