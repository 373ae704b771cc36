//! Static catalog of supported boards.
//!
//! Boards are grouped by platform family; each entry pairs the name shown in
//! menus with the fully qualified board identifier the build toolchain
//! expects. Any other identifier can still be entered by hand.

/// A single board variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Board {
    /// Human-readable name shown in menus.
    pub name: &'static str,
    /// Platform-qualified identifier passed to the toolchain.
    pub id: &'static str,
}

/// A platform family and its boards, in menu order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardFamily {
    /// Family name, e.g. `ESP8266`.
    pub name: &'static str,
    /// Boards belonging to the family.
    pub boards: &'static [Board],
}

const fn board(name: &'static str, id: &'static str) -> Board {
    Board { name, id }
}

/// ESP8266 boards.
pub const ESP8266_BOARDS: &[Board] = &[
    board("NodeMCU 1.0 (ESP-12E Module)", "esp8266:esp8266:nodemcuv2"),
    board("NodeMCU 0.9 (ESP-12 Module)", "esp8266:esp8266:nodemcu"),
    board("LOLIN(WEMOS) D1 R2 & mini", "esp8266:esp8266:d1_mini"),
    board("LOLIN(WEMOS) D1 mini Pro", "esp8266:esp8266:d1_mini_pro"),
    board("Generic ESP8266 Module", "esp8266:esp8266:generic"),
    board("Generic ESP8285 Module", "esp8266:esp8266:esp8285"),
    board("Adafruit Feather HUZZAH ESP8266", "esp8266:esp8266:huzzah"),
    board("SparkFun ESP8266 Thing", "esp8266:esp8266:thing"),
];

/// ESP32 boards.
pub const ESP32_BOARDS: &[Board] = &[
    board("ESP32 Dev Module", "esp32:esp32:esp32"),
    board("ESP32-S2 Dev Module", "esp32:esp32:esp32s2"),
    board("ESP32-S3 Dev Module", "esp32:esp32:esp32s3"),
    board("ESP32-C3 Dev Module", "esp32:esp32:esp32c3"),
    board("ESP32 Wrover Module", "esp32:esp32:esp32wrover"),
    board("WEMOS D1 MINI ESP32", "esp32:esp32:d1_mini32"),
    board("NodeMCU-32S", "esp32:esp32:nodemcu-32s"),
    board("Adafruit ESP32 Feather", "esp32:esp32:featheresp32"),
];

/// All families in menu order.
pub const BOARD_CATALOG: &[BoardFamily] = &[
    BoardFamily {
        name: "ESP8266",
        boards: ESP8266_BOARDS,
    },
    BoardFamily {
        name: "ESP32",
        boards: ESP32_BOARDS,
    },
];

/// Iterate over every board in menu order, paired with its family name.
pub fn all_boards() -> impl Iterator<Item = (&'static str, &'static Board)> {
    BOARD_CATALOG
        .iter()
        .flat_map(|family| family.boards.iter().map(move |b| (family.name, b)))
}

/// Look a board up by identifier or by display name (case-insensitive).
#[must_use]
pub fn find_board(query: &str) -> Option<&'static Board> {
    let query = query.trim();
    all_boards()
        .map(|(_, b)| b)
        .find(|b| b.id == query || b.name.eq_ignore_ascii_case(query))
}

/// Check that a free-form board identifier is plausible.
///
/// The toolchain performs the real validation; here we only reject values
/// that could never be an identifier.
#[must_use]
pub fn is_plausible_board_id(id: &str) -> bool {
    !id.is_empty() && !id.chars().any(char::is_whitespace)
}

/// Render the catalog as indented text, one board per line.
#[must_use]
pub fn catalog_listing() -> String {
    let mut text = String::new();
    for family in BOARD_CATALOG {
        text.push_str(family.name);
        text.push_str(":\n");
        for b in family.boards {
            text.push_str(&format!("  {:<34} {}\n", b.name, b.id));
        }
    }
    text
}
