//! ASCII rendering for wave plans.

use crate::models::{Risk, Wave};

const LOW: char = '○';
const MEDIUM: char = '◐';
const HIGH: char = '●';
const WOW: char = '★';

/// Get the symbol for a risk tier.
fn risk_symbol(risk: Risk) -> char {
    match risk {
        Risk::Low => LOW,
        Risk::Medium => MEDIUM,
        Risk::High => HIGH,
    }
}

/// Render waves as ASCII art with risk symbols and business value.
///
/// Example output:
/// ```text
/// Wave 1 (MVP)
/// ├── ● Auction System [L] value 10 ★
/// ├── ◐ Shopping Cart [L] value 10
/// └── ○ Web3 Wallet Connection [M] value 9 ★
/// Wave 2
/// └── ● Escrow Contract [L] value 7
/// ```
pub fn render_plan(waves: &[Wave]) -> String {
    let mut output = String::new();
    for wave in waves {
        render_wave(&mut output, wave);
    }
    output
}

fn render_wave(output: &mut String, wave: &Wave) {
    output.push_str(&wave.label());
    output.push('\n');

    for (i, feature) in wave.features().iter().enumerate() {
        let is_last = i == wave.len() - 1;
        let branch = if is_last { "└── " } else { "├── " };
        output.push_str(branch);
        output.push(risk_symbol(feature.risk));
        output.push(' ');
        output.push_str(&format!(
            "{} [{}] value {}",
            feature.title,
            feature.size.as_str(),
            feature.business_value
        ));
        if feature.wow_factor {
            output.push(' ');
            output.push(WOW);
        }
        output.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Feature, Size};
    use crate::planner::sequence;

    fn make_feature(title: &str, risk: Risk, value: u8, wow: bool) -> Feature {
        Feature {
            id: title.to_lowercase(),
            project_id: "p1".to_string(),
            title: title.to_string(),
            description: String::new(),
            size: Size::M,
            risk,
            business_value: value,
            wow_factor: wow,
            category: Category::Logic,
        }
    }

    #[test]
    fn test_empty_plan() {
        assert_eq!(render_plan(&[]), "");
    }

    #[test]
    fn test_single_wave() {
        let waves = sequence(vec![
            make_feature("Login", Risk::Low, 8, false),
            make_feature("Cart", Risk::Medium, 9, true),
        ]);
        let output = render_plan(&waves);
        assert_eq!(
            output,
            "Wave 1 (MVP)\n├── ◐ Cart [M] value 9 ★\n└── ○ Login [M] value 8\n"
        );
    }

    #[test]
    fn test_high_risk_split_across_waves() {
        let waves = sequence(vec![
            make_feature("Auction", Risk::High, 10, false),
            make_feature("Escrow", Risk::High, 9, false),
        ]);
        let output = render_plan(&waves);
        assert_eq!(
            output,
            "Wave 1 (MVP)\n└── ● Auction [M] value 10\nWave 2\n└── ● Escrow [M] value 9\n"
        );
    }
}
