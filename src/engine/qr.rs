// wweb Engine: Terminal QR
//
// Renders a pairing QR payload for the operator's terminal.

use crate::atoms::error::{EngineError, EngineResult};
use qrcode::{Color, EcLevel, QrCode};

/// Packs two module rows into one text line with `▀`, `▄`, `█` and space,
/// surrounded by a one-module quiet zone.
pub fn render_qr_terminal(qr_data: &str) -> EngineResult<String> {
    let code = QrCode::with_error_correction_level(qr_data.as_bytes(), EcLevel::L)
        .map_err(|e| EngineError::Qr(format!("QR generation failed: {}", e)))?;

    let width = code.width();
    let colors: Vec<Color> = code.into_colors();
    // Coordinates include the quiet zone, hence the signed offset.
    let is_dark = |row: isize, col: isize| -> bool {
        if row < 0 || col < 0 {
            return false;
        }
        let (row, col) = (row as usize, col as usize);
        row < width && col < width && colors[row * width + col] == Color::Dark
    };

    let edge = width as isize + 1;
    let mut out = String::new();
    let mut row: isize = -1;
    while row < edge {
        for col in -1..edge {
            out.push(match (is_dark(row, col), is_dark(row + 1, col)) {
                (true, true) => '█',
                (true, false) => '▀',
                (false, true) => '▄',
                (false, false) => ' ',
            });
        }
        out.push('\n');
        row += 2;
    }

    Ok(out)
}

/// Writes the QR to stdout, falling back to the raw payload.
pub fn print_qr(qr_data: &str) {
    match render_qr_terminal(qr_data) {
        Ok(rendered) => println!("{}", rendered),
        Err(e) => {
            log::warn!("[qr] {}", e);
            println!("{}", qr_data);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_square_block() {
        let out = render_qr_terminal("2@abcdef,ghijkl,mnopqr").unwrap();
        let lines: Vec<&str> = out.lines().collect();
        let width = lines[0].chars().count();
        assert!(width >= 23); // version 1 is 21 modules + quiet zone
        assert!(lines.iter().all(|l| l.chars().count() == width));
        assert_eq!(lines.len(), (width + 1) / 2);
        assert!(out.contains('█'));
    }

    #[test]
    fn oversized_payload_is_qr_error() {
        let huge = "x".repeat(10_000);
        assert!(matches!(render_qr_terminal(&huge), Err(EngineError::Qr(_))));
    }
}
