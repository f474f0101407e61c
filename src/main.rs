use std::path::PathBuf;

use anyhow::Context;
use clap::builder::PossibleValuesParser;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod api;
mod buyer;
mod config;
mod controller;
mod models;
mod outreach;
mod reference;
mod simulate;
mod wizard;

use api::{HttpApi, WasteApi};
use buyer::BuyerForm;
use config::ClientConfig;
use controller::{FlowError, WizardController};
use simulate::SimulatedApi;
use wizard::{Event, Field, Step};

#[derive(Parser)]
#[command(name = "waste-match")]
#[command(about = "Predict industrial waste streams and find circular buyers", long_about = None)]
struct Cli {
    /// Matching service base URL (overrides WASTE_MATCH_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct OperationalArgs {
    #[arg(
        long,
        value_parser = PossibleValuesParser::new(reference::INDUSTRIES.iter().map(|i| i.name))
    )]
    industry: Option<String>,
    #[arg(long)]
    product: Option<String>,
    #[arg(long)]
    process: Option<String>,
    #[arg(long)]
    machinery: Option<String>,
    #[arg(long, value_parser = PossibleValuesParser::new(reference::SCALES.iter().copied()))]
    scale: Option<String>,
    #[arg(
        long,
        value_parser = PossibleValuesParser::new(reference::LOCATIONS.iter().map(|l| l.city))
    )]
    location: Option<String>,
    /// Units per month, or `auto` to use the value derived from the scale
    #[arg(long, value_parser = parse_units)]
    units: Option<Units>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Units {
    Auto,
    Manual(u32),
}

fn parse_units(value: &str) -> Result<Units, String> {
    if value.eq_ignore_ascii_case("auto") {
        return Ok(Units::Auto);
    }
    value
        .parse()
        .map(Units::Manual)
        .map_err(|_| format!("expected a whole number or `auto`, got `{value}`"))
}

#[derive(Subcommand)]
enum Commands {
    /// List industries, locations and scale tiers
    Reference,
    /// Generate a waste profile, find matches and send outreach
    Analyze {
        #[command(flatten)]
        input: OperationalArgs,
        /// Use built-in sample responses instead of the service
        #[arg(long)]
        simulate: bool,
        /// Stop after showing matches
        #[arg(long)]
        skip_outreach: bool,
        /// Write a markdown report of the analysis
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Save the operational input for later
    SaveForm {
        #[command(flatten)]
        input: OperationalArgs,
    },
    /// List saved forms
    Submissions,
    /// Register a new waste buyer
    AddBuyer(BuyerArgs),
    /// Register buyers from a CSV file
    ImportBuyers {
        #[arg(long)]
        csv: PathBuf,
    },
}

#[derive(Args)]
struct BuyerArgs {
    #[arg(long)]
    company_name: String,
    #[arg(long, value_parser = PossibleValuesParser::new(reference::COMPANY_TYPES.iter().copied()))]
    company_type: String,
    /// Comma-separated waste types, e.g. metal_scrap,plastic_waste
    #[arg(long)]
    accepted_waste_types: String,
    #[arg(
        long,
        value_parser = PossibleValuesParser::new(reference::WASTE_CATEGORIES.iter().copied())
    )]
    accepted_category: String,
    #[arg(
        long,
        value_parser = PossibleValuesParser::new(reference::QUALITY_GRADES.iter().copied())
    )]
    min_quality_grade: String,
    #[arg(long, default_value_t = 1)]
    min_monthly_volume_tons: u32,
    #[arg(long, default_value_t = 100)]
    max_monthly_volume_tons: u32,
    #[arg(long)]
    city: String,
    #[arg(long)]
    pricing_model: String,
    /// Repeat to select several, in order
    #[arg(
        long = "certification",
        value_parser = PossibleValuesParser::new(reference::CERTIFICATIONS.iter().copied())
    )]
    certifications: Vec<String>,
    #[arg(long)]
    contact_name: String,
    #[arg(long)]
    contact_email: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env().context("invalid client configuration")?;
    if let Some(url) = cli.api_url.as_deref() {
        config = config.with_base_url(url).context("invalid --api-url")?;
    }

    match cli.command {
        Commands::Reference => print_reference(),
        Commands::Analyze {
            input,
            simulate,
            skip_outreach,
            report,
        } => {
            if simulate {
                let mut controller = WizardController::new(SimulatedApi);
                analyze(&mut controller, &input, skip_outreach, report).await?;
            } else {
                let api = HttpApi::new(&config).context("failed to build HTTP client")?;
                let mut controller = WizardController::new(api);
                analyze(&mut controller, &input, skip_outreach, report).await?;
            }
        }
        Commands::SaveForm { input } => {
            let api = HttpApi::new(&config).context("failed to build HTTP client")?;
            let mut controller = WizardController::new(api);
            fill_input(&mut controller, &input)?;
            controller.save_form().await.map_err(notify)?;
            println!("Form saved successfully!");
        }
        Commands::Submissions => {
            let api = HttpApi::new(&config).context("failed to build HTTP client")?;
            let submissions = api
                .list_submissions()
                .await
                .context("failed to load submissions")?;

            if submissions.is_empty() {
                println!("No saved forms.");
                return Ok(());
            }

            println!("Saved forms:");
            for submission in submissions {
                let data = submission.data;
                println!(
                    "- {} {} / {} / {} ({} scale, {} units/month) in {}",
                    submission.timestamp,
                    data.industry,
                    data.product,
                    data.process,
                    data.scale,
                    data.units_per_month,
                    data.location
                );
            }
        }
        Commands::AddBuyer(args) => {
            let api = HttpApi::new(&config).context("failed to build HTTP client")?;
            add_buyer(&api, args).await?;
        }
        Commands::ImportBuyers { csv } => {
            let api = HttpApi::new(&config).context("failed to build HTTP client")?;
            let forms = buyer::read_buyers_from_path(&csv)?;
            let total = forms.len();
            let summary = buyer::import_buyers(&api, forms).await;

            for (company, alert) in &summary.failed {
                eprintln!("- {company}: {alert}");
            }
            println!(
                "Added {} of {total} buyers from {}.",
                summary.accepted,
                csv.display()
            );
        }
    }

    Ok(())
}

fn notify(err: FlowError) -> anyhow::Error {
    eprintln!("{}", err.alert());
    anyhow::Error::new(err)
}

fn print_step(step: Step) {
    println!();
    println!("[{}/{}] {}", step.number(), Step::ALL.len(), step.label());
}

fn print_reference() {
    println!("Industries:");
    for industry in reference::INDUSTRIES {
        println!("- {}", industry.name);
        println!("    products:  {}", industry.products.join(", "));
        println!("    processes: {}", industry.processes.join(", "));
        println!("    machinery: {}", industry.machinery.join(", "));
    }

    println!("Locations:");
    for location in reference::LOCATIONS {
        println!(
            "- {} ({}) {:.2}, {:.2}",
            location.city, location.state, location.lat, location.lng
        );
    }

    println!("Scales:");
    for scale in reference::SCALES {
        println!("- {} ({} units/month)", scale, wizard::units_per_month(scale));
    }
}

fn fill_input<A: WasteApi>(
    controller: &mut WizardController<A>,
    input: &OperationalArgs,
) -> anyhow::Result<()> {
    if let Some(industry) = &input.industry {
        controller.apply(Event::Edit(Field::Industry, industry.clone()));
    }

    let choices = reference::industry(&controller.state().data().industry);
    let dependents = [
        (Field::Product, &input.product, choices.map(|c| c.products)),
        (Field::Process, &input.process, choices.map(|c| c.processes)),
        (Field::Machinery, &input.machinery, choices.map(|c| c.machinery)),
    ];
    for (field, value, allowed) in dependents {
        let Some(value) = value else { continue };
        let Some(allowed) = allowed else {
            anyhow::bail!("--industry is required before choosing {field:?}");
        };
        if !allowed.contains(&value.as_str()) {
            anyhow::bail!(
                "{value} is not a {field:?} option; choose one of: {}",
                allowed.join(", ")
            );
        }
        controller.apply(Event::Edit(field, value.clone()));
    }

    if let Some(scale) = &input.scale {
        controller.apply(Event::Edit(Field::Scale, scale.clone()));
    }
    if let Some(location) = &input.location {
        controller.apply(Event::Edit(Field::Location, location.clone()));
    }
    match input.units {
        Some(Units::Manual(units)) => {
            controller.apply(Event::SetUnits(units));
        }
        Some(Units::Auto) => {
            controller.apply(Event::ResetUnits);
        }
        None => {}
    }

    Ok(())
}

async fn analyze<A: WasteApi>(
    controller: &mut WizardController<A>,
    input: &OperationalArgs,
    skip_outreach: bool,
    report: Option<PathBuf>,
) -> anyhow::Result<()> {
    fill_input(controller, input)?;
    let data = controller.state().data().clone();
    print_step(Step::Input);
    println!(
        "{} / {} / {} / {} at {} scale in {} ({} units/month)",
        data.industry,
        data.product,
        data.process,
        data.machinery,
        data.scale,
        data.location,
        data.units_per_month
    );

    controller.generate_profile().await.map_err(notify)?;
    print_step(controller.state().step());
    if let Some(profile) = controller.state().profile() {
        println!(
            "Predicted waste profile ({:.0}% confidence):",
            profile.confidence * 100.0
        );
        for waste in &profile.waste_types {
            println!(
                "- {}: {}, {}, contamination {}, {}",
                waste.waste_type,
                waste.quantity,
                waste.quality,
                waste.contamination,
                waste.hazard_level
            );
        }
        for flag in &profile.regulatory_flags {
            println!("! {flag}");
        }
    }

    controller.find_matches().await.map_err(notify)?;
    print_step(controller.state().step());
    println!("Optimized matches ({}):", controller.state().matches().len());
    for m in controller.state().matches() {
        println!(
            "- {} ({}) score {:.1}, {:.1} km, {}",
            m.company, m.buyer_type, m.overall_score, m.distance, m.pricing
        );
    }

    if let Some(path) = &report {
        if let Some(profile) = controller.state().profile() {
            let text = outreach::build_report(&data, profile, controller.state().matches());
            std::fs::write(path, text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Report written to {}.", path.display());
        }
    }

    if skip_outreach {
        return Ok(());
    }

    controller.send_outreach().await.map_err(notify)?;
    print_step(controller.state().step());
    let state = controller.state();
    if state.outreach_sent() {
        println!(
            "Deal briefs generated for {} potential partners.",
            state.matches().len()
        );
        if let (Some(profile), Some(top)) = (state.profile(), state.matches().first()) {
            println!();
            print!("{}", outreach::preview_email(&data, profile, top));
        }
    }

    controller.reset();
    tracing::debug!(step = ?controller.state().step(), "ready for a new analysis");
    Ok(())
}

fn buyer_form(args: BuyerArgs) -> BuyerForm {
    let mut form = BuyerForm::default();
    form.company_name = args.company_name;
    form.company_type = args.company_type;
    form.accepted_waste_types = args.accepted_waste_types;
    form.accepted_categories = args.accepted_category;
    form.min_quality_grade = args.min_quality_grade;
    form.min_monthly_volume_tons = args.min_monthly_volume_tons;
    form.max_monthly_volume_tons = args.max_monthly_volume_tons;
    form.pricing_model = args.pricing_model;
    form.contact_email = args.contact_email;
    form.contact_name = args.contact_name;

    if !form.select_city(&args.city) {
        tracing::warn!(city = %args.city, "city not in location table; location left blank");
    }
    for certification in &args.certifications {
        form.toggle_certification(certification);
    }
    form
}

async fn add_buyer(api: &HttpApi, args: BuyerArgs) -> anyhow::Result<()> {
    let mut form = buyer_form(args);

    match form.submit(api).await {
        Ok(ack) => {
            println!("Buyer added successfully!");
            if let Some(message) = ack.message {
                println!("{message}");
            }
            if let Some(id) = ack.buyer_id {
                println!("Buyer id: {id}");
            }
            tracing::debug!(city = form.city(), "returning after success view");
            tokio::time::sleep(buyer::SUCCESS_RETURN_DELAY).await;
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", err.alert());
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("waste-match").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn add_buyer_args_build_the_submitted_record() {
        let cli = parse(&[
            "add-buyer",
            "--company-name",
            "Deccan Metals",
            "--company-type",
            "Metal Recycler",
            "--accepted-waste-types",
            "metal_scrap,steel_shavings",
            "--accepted-category",
            "metal",
            "--min-quality-grade",
            "Grade B",
            "--max-monthly-volume-tons",
            "250",
            "--city",
            "Hyderabad",
            "--pricing-model",
            "per_ton",
            "--certification",
            "ISO_14001",
            "--certification",
            "CPCB_Auth",
            "--contact-name",
            "Ravi K",
            "--contact-email",
            "ravi@deccan.in",
        ]);
        let Commands::AddBuyer(args) = cli.command else {
            panic!("expected add-buyer");
        };

        let record = buyer_form(args).to_record();
        assert_eq!(record.company_name, "Deccan Metals");
        assert_eq!(record.accepted_categories, "metal");
        assert_eq!(record.min_monthly_volume_tons, 1);
        assert_eq!(record.max_monthly_volume_tons, 250);
        assert_eq!(record.city, "Hyderabad");
        assert_eq!(record.state, "Telangana");
        assert_eq!(record.lat, 17.39);
        assert_eq!(record.certifications, "ISO_14001,CPCB_Auth");
        assert_eq!(record.contact_email, "ravi@deccan.in");
    }

    #[test]
    fn add_buyer_rejects_unknown_certification() {
        let result = Cli::try_parse_from([
            "waste-match",
            "add-buyer",
            "--company-name",
            "X",
            "--company-type",
            "Waste Broker",
            "--accepted-waste-types",
            "mixed",
            "--accepted-category",
            "mixed",
            "--min-quality-grade",
            "Clean",
            "--city",
            "Delhi",
            "--pricing-model",
            "flat",
            "--certification",
            "ISO_27001",
            "--contact-name",
            "Y",
            "--contact-email",
            "y@x.in",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn units_accept_a_number_or_auto() {
        assert_eq!(parse_units("750"), Ok(Units::Manual(750)));
        assert_eq!(parse_units("AUTO"), Ok(Units::Auto));
        assert!(parse_units("lots").is_err());
    }

    #[test]
    fn units_auto_restores_the_scale_value() {
        let cli = parse(&["save-form", "--scale", "large", "--units", "auto"]);
        let Commands::SaveForm { input } = cli.command else {
            panic!("expected save-form");
        };
        let mut controller = WizardController::new(SimulatedApi);
        fill_input(&mut controller, &input).unwrap();
        assert_eq!(controller.state().data().units_per_month, 50_000);

        let cli = parse(&["save-form", "--scale", "large", "--units", "1200"]);
        let Commands::SaveForm { input } = cli.command else {
            panic!("expected save-form");
        };
        let mut controller = WizardController::new(SimulatedApi);
        fill_input(&mut controller, &input).unwrap();
        assert_eq!(controller.state().data().units_per_month, 1200);
    }

    #[test]
    fn product_must_belong_to_the_industry() {
        let cli = parse(&[
            "save-form",
            "--industry",
            "textiles",
            "--product",
            "transmissions",
        ]);
        let Commands::SaveForm { input } = cli.command else {
            panic!("expected save-form");
        };
        let mut controller = WizardController::new(SimulatedApi);
        let err = fill_input(&mut controller, &input).unwrap_err();
        assert!(err.to_string().contains("is not a Product option"));
    }

    #[tokio::test]
    async fn simulated_analysis_finishes_back_on_input() {
        let cli = parse(&[
            "analyze",
            "--simulate",
            "--industry",
            "automotive",
            "--scale",
            "medium",
            "--location",
            "Pune",
        ]);
        let Commands::Analyze {
            input,
            skip_outreach,
            ..
        } = cli.command
        else {
            panic!("expected analyze");
        };
        let mut controller = WizardController::new(SimulatedApi);
        analyze(&mut controller, &input, skip_outreach, None)
            .await
            .unwrap();

        let state = controller.state();
        assert_eq!(state.step(), Step::Input);
        assert!(state.profile().is_none());
        assert!(state.matches().is_empty());
        assert!(!state.outreach_sent());
    }
}
