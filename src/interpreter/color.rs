//! Color arguments → `#rrggbb`.

use crate::dsl::Value;

fn named_color(name: &str) -> Option<&'static str> {
    let hex = match name {
        "red" => "#ff0000",
        "green" | "lime" => "#00ff00",
        "blue" => "#0000ff",
        "yellow" => "#ffff00",
        "orange" => "#ffa500",
        "purple" => "#800080",
        "pink" => "#ffc0cb",
        "cyan" | "aqua" => "#00ffff",
        "magenta" => "#ff00ff",
        "maroon" => "#800000",
        "navy" => "#000080",
        "olive" => "#808000",
        "teal" => "#008080",
        "silver" => "#c0c0c0",
        "gray" | "grey" => "#808080",
        "black" => "#000000",
        "white" => "#ffffff",
        "brown" => "#a52a2a",
        "violet" => "#ee82ee",
        "indigo" => "#4b0082",
        "gold" => "#ffd700",
        "coral" => "#ff7f50",
        "salmon" => "#fa8072",
        "khaki" => "#f0e68c",
        "tan" => "#d2b48c",
        "beige" => "#f5f5dc",
        "ivory" => "#fffff0",
        "lavender" => "#e6e6fa",
        "plum" => "#dda0dd",
        "turquoise" => "#40e0d0",
        "crimson" => "#dc143c",
        "darkred" => "#8b0000",
        "darkgreen" => "#006400",
        "darkblue" => "#00008b",
        "lightblue" => "#add8e6",
        "lightgreen" => "#90ee90",
        "lightgray" | "lightgrey" => "#d3d3d3",
        "darkgray" | "darkgrey" => "#a9a9a9",
        _ => return None,
    };
    Some(hex)
}

/// Resolve a `color=` argument.
///
/// Known names map to hex, hex strings are lower-cased, and unknown names
/// pass through unchanged for the executor to deal with. Numbers are read as
/// `0xrrggbb`. Returns `None` for values that cannot be a color.
pub fn resolve_color(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let key = s.trim().to_lowercase();
            if let Some(hex) = named_color(&key) {
                Some(hex.to_string())
            } else if key.starts_with('#') {
                Some(key)
            } else {
                Some(s.clone())
            }
        }
        Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 && *n <= f64::from(0xff_ff_ffu32) => {
            Some(format!("#{:06x}", *n as u32))
        }
        _ => None,
    }
}
