/// Viridis sampled at 0.0, 0.1, …, 1.0.
const VIRIDIS: [[u8; 3]; 11] = [
    [68, 1, 84],
    [72, 36, 117],
    [65, 68, 135],
    [53, 95, 141],
    [42, 120, 142],
    [33, 145, 140],
    [34, 168, 132],
    [68, 190, 112],
    [122, 209, 81],
    [189, 223, 38],
    [253, 231, 37],
];

/// Samples the viridis colormap at `t` (clamped to 0.0 – 1.0).
pub fn viridis(t: f64) -> [u8; 3] {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let position = t * (VIRIDIS.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = (lower + 1).min(VIRIDIS.len() - 1);
    let frac = position - lower as f64;

    let mut color = [0u8; 3];
    for (channel, out) in color.iter_mut().enumerate() {
        let a = VIRIDIS[lower][channel] as f64;
        let b = VIRIDIS[upper][channel] as f64;
        *out = (a + (b - a) * frac).round() as u8;
    }
    color
}

/// Parses `#rrggbb` (leading `#` optional).
pub fn parse_hex_color(hex: &str) -> Option<[u8; 3]> {
    let hex = hex.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}
