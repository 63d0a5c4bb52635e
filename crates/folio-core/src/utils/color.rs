//! Gradient classes assigned to skills and services by icon.

use rand::Rng;

const PALETTE: [&str; 10] = [
    "from-blue-400 to-blue-600",
    "from-purple-400 to-purple-600",
    "from-green-400 to-green-600",
    "from-yellow-400 to-yellow-600",
    "from-red-400 to-red-600",
    "from-pink-400 to-pink-600",
    "from-indigo-400 to-indigo-600",
    "from-cyan-400 to-cyan-600",
    "from-teal-400 to-teal-600",
    "from-orange-400 to-orange-600",
];

pub fn palette_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

fn known_icon_color(icon: &str) -> Option<&'static str> {
    let color = match icon {
        "Code" => "from-blue-400 to-blue-600",
        "Globe" => "from-green-400 to-green-600",
        "Database" => "from-purple-400 to-purple-600",
        "Smartphone" => "from-pink-400 to-pink-600",
        "Monitor" => "from-cyan-400 to-cyan-600",
        "Server" => "from-indigo-400 to-indigo-600",
        "Cloud" => "from-teal-400 to-teal-600",
        "Shield" => "from-red-400 to-red-600",
        "Zap" => "from-yellow-400 to-yellow-600",
        "Rocket" => "from-orange-400 to-orange-600",
        _ => return None,
    };
    Some(color)
}

/// Color for an icon name; unknown icons get a random palette entry.
pub fn color_for_icon(icon: &str) -> &'static str {
    known_icon_color(icon)
        .unwrap_or_else(|| palette_color(rand::thread_rng().gen_range(0..PALETTE.len())))
}
