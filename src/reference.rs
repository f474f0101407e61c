//! Static reference tables used to populate form choices.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Industry {
    pub name: &'static str,
    pub products: &'static [&'static str],
    pub processes: &'static [&'static str],
    pub machinery: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub city: &'static str,
    pub state: &'static str,
    pub lat: f64,
    pub lng: f64,
}

pub const INDUSTRIES: &[Industry] = &[
    Industry {
        name: "automotive",
        products: &["engine_components", "transmissions", "body_panels", "electrical_systems"],
        processes: &["cnc_machining", "stamping", "welding", "assembly", "painting"],
        machinery: &["cnc_lathe", "milling_machine", "press", "welding_robot", "spray_booth"],
    },
    Industry {
        name: "electronics",
        products: &["circuit_boards", "semiconductors", "displays", "connectors"],
        processes: &["smt_assembly", "wave_soldering", "testing", "packaging"],
        machinery: &["pick_place", "reflow_oven", "wave_solder", "aoi_machine"],
    },
    Industry {
        name: "food_processing",
        products: &["packaged_foods", "beverages", "frozen_goods", "snacks"],
        processes: &["cooking", "mixing", "packaging", "sterilization", "freezing"],
        machinery: &["industrial_oven", "mixer", "packaging_line", "autoclave", "blast_freezer"],
    },
    Industry {
        name: "textiles",
        products: &["fabric", "garments", "home_textiles", "industrial_textiles"],
        processes: &["weaving", "dyeing", "cutting", "sewing", "finishing"],
        machinery: &["loom", "dyeing_machine", "cutting_table", "sewing_machine", "heat_press"],
    },
    Industry {
        name: "metalworking",
        products: &["structural_steel", "custom_parts", "tools", "metal_fixtures"],
        processes: &["cutting", "welding", "grinding", "drilling", "heat_treatment"],
        machinery: &["plasma_cutter", "welder", "grinder", "drill_press", "furnace"],
    },
    Industry {
        name: "chemical",
        products: &["industrial_chemicals", "solvents", "cleaning_agents", "coatings"],
        processes: &["mixing", "distillation", "filtration", "reaction", "packaging"],
        machinery: &["reactor", "distillation_column", "filter_press", "mixer", "filling_machine"],
    },
];

pub const LOCATIONS: &[Location] = &[
    Location {
        city: "Lucknow",
        state: "Uttar Pradesh",
        lat: 26.85,
        lng: 80.95,
    },
    Location {
        city: "Mumbai",
        state: "Maharashtra",
        lat: 19.08,
        lng: 72.88,
    },
    Location {
        city: "Delhi",
        state: "Delhi",
        lat: 28.61,
        lng: 77.21,
    },
    Location {
        city: "Bengaluru",
        state: "Karnataka",
        lat: 12.97,
        lng: 77.59,
    },
    Location {
        city: "Chennai",
        state: "Tamil Nadu",
        lat: 13.08,
        lng: 80.27,
    },
    Location {
        city: "Hyderabad",
        state: "Telangana",
        lat: 17.39,
        lng: 78.49,
    },
    Location {
        city: "Kolkata",
        state: "West Bengal",
        lat: 22.57,
        lng: 88.36,
    },
    Location {
        city: "Pune",
        state: "Maharashtra",
        lat: 18.52,
        lng: 73.85,
    },
    Location {
        city: "Ahmedabad",
        state: "Gujarat",
        lat: 23.02,
        lng: 72.57,
    },
    Location {
        city: "Jaipur",
        state: "Rajasthan",
        lat: 26.91,
        lng: 75.79,
    },
];

pub const SCALES: &[&str] = &["small", "medium", "large", "xlarge"];

pub const COMPANY_TYPES: &[&str] = &[
    "Hazardous Waste Facility",
    "Waste Broker",
    "Wire Manufacturer",
    "Recycling Facility",
    "Metal Recycler",
    "Plastic Recycler",
    "E-Waste Processor",
    "Oil Reclamation Unit",
    "Chemical Processor",
];

pub const WASTE_CATEGORIES: &[&str] = &[
    "hazardous",
    "mixed",
    "metal",
    "plastic",
    "electronic",
    "organic",
    "chemical",
];

pub const QUALITY_GRADES: &[&str] = &["Grade A", "Grade B", "Grade C", "Clean", "Contaminated"];

pub const CERTIFICATIONS: &[&str] = &["CPCB_Auth", "SPCB_Auth", "MoEFCC", "ISO_14001", "ISO_9001"];

pub fn industry(name: &str) -> Option<&'static Industry> {
    INDUSTRIES.iter().find(|industry| industry.name == name)
}

/// Exact, case-sensitive match on the city name.
pub fn location(city: &str) -> Option<&'static Location> {
    LOCATIONS.iter().find(|location| location.city == city)
}
