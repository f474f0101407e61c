use std::fmt::Write;

use crate::models::{Match, OperationalData, WasteProfile};
use crate::reference;

/// Formats whole rupees with Indian digit grouping, e.g. `₹2,32,400`.
pub fn format_inr(amount: f64) -> String {
    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    let digits = format!("{:.0}", rounded.abs());

    let grouped = if digits.len() <= 3 {
        digits
    } else {
        let (head, tail) = digits.split_at(digits.len() - 3);
        let mut groups: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 2 {
            groups.push(&head[end - 2..end]);
            end -= 2;
        }
        groups.push(&head[..end]);
        groups.reverse();
        format!("{},{}", groups.join(","), tail)
    };

    format!("{sign}₹{grouped}")
}

fn place(location: &str) -> String {
    match reference::location(location) {
        Some(known) => format!("{}, {}", known.city, known.state),
        None if location.is_empty() => "our region".to_string(),
        None => location.to_string(),
    }
}

/// The deal brief sent to the best-scoring match. `cost_saving` arrives in
/// thousands of rupees per year.
pub fn preview_email(data: &OperationalData, profile: &WasteProfile, top: &Match) -> String {
    let mut output = String::new();
    let lead = profile.waste_types.first();

    let _ = writeln!(output, "To: {}", top.company);
    let _ = writeln!(
        output,
        "Subject: Circular material opportunity{}",
        lead.map(|w| format!(": {}", w.waste_type)).unwrap_or_default()
    );
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Our AI matching platform has identified a high-compatibility opportunity between your \
         material requirements and our facility's waste stream in {}.",
        place(&data.location)
    );
    let _ = writeln!(output);

    if let Some(waste) = lead {
        let _ = writeln!(
            output,
            "• Material: {} ({}, {} contamination)",
            waste.waste_type, waste.quality, waste.contamination
        );
        let _ = writeln!(output, "• Volume: {}", waste.quantity);
    }
    let _ = writeln!(output, "• Match Score: {:.0}/100", top.overall_score);
    let _ = writeln!(
        output,
        "• Estimated Value: {}/year cost savings",
        format_inr(top.cost_saving * 1000.0)
    );
    let _ = writeln!(
        output,
        "• Environmental Impact: {} tons CO₂ avoided annually",
        top.environmental_impact.co2_saved
    );

    output
}

pub fn build_report(data: &OperationalData, profile: &WasteProfile, matches: &[Match]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Waste Match Analysis");
    let _ = writeln!(
        output,
        "Industry {} in {} ({} scale, {} units/month)",
        or_dash(&data.industry),
        or_dash(&data.location),
        or_dash(&data.scale),
        data.units_per_month
    );
    if !data.product.is_empty() || !data.process.is_empty() || !data.machinery.is_empty() {
        let _ = writeln!(
            output,
            "Product {}, process {}, machinery {}",
            or_dash(&data.product),
            or_dash(&data.process),
            or_dash(&data.machinery)
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "## Waste Profile ({:.0}% confidence)",
        profile.confidence * 100.0
    );
    if profile.waste_types.is_empty() {
        let _ = writeln!(output, "No waste streams predicted.");
    } else {
        for waste in &profile.waste_types {
            let _ = writeln!(
                output,
                "- {}: {}, {}, contamination {}, {}",
                waste.waste_type,
                waste.quantity,
                waste.quality,
                waste.contamination,
                waste.hazard_level
            );
        }
    }

    if !profile.regulatory_flags.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Regulatory Requirements");
        for flag in &profile.regulatory_flags {
            let _ = writeln!(output, "- {flag}");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Matches ({})", matches.len());
    if matches.is_empty() {
        let _ = writeln!(output, "No buyers matched this profile.");
    } else {
        for m in matches {
            let _ = writeln!(
                output,
                "- {} ({}) score {:.1}: material {:.1}, quality {:.1}, {:.1} km, \
                 saves {}/year, {} t CO₂, {} t diverted; {}; {}; {}",
                m.company,
                m.buyer_type,
                m.overall_score,
                m.material_match,
                m.quality_fit,
                m.distance,
                format_inr(m.cost_saving * 1000.0),
                m.environmental_impact.co2_saved,
                m.environmental_impact.landfill_diverted,
                m.compliance,
                m.requirements,
                m.pricing
            );
        }
    }

    output
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}
