use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use realty_projection_core::amortization::params::{
    CalculationParameters, DownPayment, KeyPayment, PartitioningMode, Periodicity,
    ReinforcementPolicy,
};
use realty_projection_core::amortization::schedule;
use realty_projection_core::correction::accumulator::CorrectionRates;

use crate::input;

/// Arguments for the amortization schedule
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to a JSON or YAML request file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// List price of the unit
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Discount off the list price
    #[arg(long)]
    pub discount: Option<Decimal>,

    /// Down payment amount
    #[arg(long, conflicts_with = "down_payment_pct")]
    pub down_payment: Option<Decimal>,

    /// Down payment as a percentage of the list price
    #[arg(long)]
    pub down_payment_pct: Option<Decimal>,

    /// Months until key delivery; defaults to the payment term
    #[arg(long)]
    pub delivery_months: Option<u32>,

    /// Number of monthly payments
    #[arg(long)]
    pub payment_months: Option<u32>,

    /// Monthly correction (%) up to delivery
    #[arg(long, default_value = "0")]
    pub correction_before: Decimal,

    /// Monthly correction (%) after delivery; defaults to the pre-delivery rate
    #[arg(long)]
    pub correction_after: Option<Decimal>,

    /// Reinforcement periodicity
    #[arg(long, value_parser = parse_periodicity, requires = "reinforcement")]
    pub periodicity: Option<Periodicity>,

    /// Nominal amount of each reinforcement
    #[arg(long, requires = "periodicity")]
    pub reinforcement: Option<Decimal>,

    /// Lump sum due on key delivery
    #[arg(long)]
    pub key_payment: Option<Decimal>,

    /// Month the key payment falls due (defaults to the delivery month)
    #[arg(long, requires = "key_payment")]
    pub key_month: Option<u32>,
}

fn parse_periodicity(s: &str) -> Result<Periodicity, String> {
    match s {
        "bimonthly" | "2" => Ok(Periodicity::Bimonthly),
        "quarterly" | "3" => Ok(Periodicity::Quarterly),
        "semiannual" | "6" => Ok(Periodicity::Semiannual),
        "annual" | "12" => Ok(Periodicity::Annual),
        other => Err(format!(
            "unknown periodicity '{other}' (bimonthly, quarterly, semiannual, annual)"
        )),
    }
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params: CalculationParameters = match input::read_request(args.input.as_deref())? {
        Some(request) => request,
        None => params_from_flags(&args)?,
    };

    let result = schedule::build_schedule(&params)?;
    Ok(serde_json::to_value(result)?)
}

fn params_from_flags(args: &ScheduleArgs) -> Result<CalculationParameters, Box<dyn std::error::Error>> {
    let price = args.price.ok_or("--price is required (or provide --input)")?;
    let payment_months = args
        .payment_months
        .ok_or("--payment-months is required (or provide --input)")?;
    let down_payment = match (args.down_payment, args.down_payment_pct) {
        (Some(v), _) => DownPayment::Value(v),
        (None, Some(p)) => DownPayment::Percentage(p),
        (None, None) => return Err("--down-payment or --down-payment-pct is required".into()),
    };

    let reinforcement = match (args.periodicity, args.reinforcement) {
        (Some(periodicity), Some(amount)) => Some(ReinforcementPolicy { periodicity, amount }),
        _ => None,
    };
    let key_payment = args.key_payment.map(|amount| KeyPayment {
        amount,
        month: args.key_month,
    });

    Ok(CalculationParameters {
        property_price: price,
        discount: args.discount.unwrap_or_default(),
        down_payment,
        delivery_months: args.delivery_months.unwrap_or(payment_months),
        payment_months,
        correction: CorrectionRates {
            rate_before_delivery: args.correction_before,
            rate_after_delivery: args.correction_after.unwrap_or(args.correction_before),
            index: None,
        },
        partitioning: PartitioningMode::Automatic {
            reinforcement,
            key_payment,
        },
    })
}
