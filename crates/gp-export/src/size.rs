/// Octets par kilo-octet affiché.
const KIB: u64 = 1024;
/// Octets par méga-octet affiché.
const MIB: u64 = 1024 * 1024;

/// Taille lisible : `"{:.1} MB"` au-delà d'1 MiB, `"{:.1} kB"` au-delà d'1 KiB,
/// sinon `"{n} B"`. Les bornes elles-mêmes restent dans l'unité inférieure.
///
/// # Example
/// ```
/// use gp_export::size::format_size;
/// assert_eq!(format_size(512), "512 B");
/// assert_eq!(format_size(1536), "1.5 kB");
/// assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
/// ```
#[must_use]
pub fn format_size(bytes: u64) -> String {
    if bytes > MIB {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    } else if bytes > KIB {
        format!("{:.1} kB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}
