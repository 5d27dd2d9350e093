use clap::Args;
use els_backtest_core::product::ProductSpec;
use rust_decimal::Decimal;
use std::path::Path;

use super::file;

/// Product terms: a JSON/YAML file, inline flags, or the default note.
#[derive(Args, Debug, Default)]
#[command(allow_hyphen_values = true)]
pub struct ProductArgs {
    /// Product terms file (.json, .yaml or .yml)
    #[arg(long)]
    pub product: Option<String>,

    /// Tenor in months (6-60)
    #[arg(long)]
    pub maturity_months: Option<u32>,

    /// Months between early redemption observations (1-12)
    #[arg(long)]
    pub obs_interval_months: Option<u32>,

    /// Early redemption levels, comma separated (e.g. 0.95,0.90,0.85)
    #[arg(long, value_delimiter = ',')]
    pub early_levels: Option<Vec<Decimal>>,

    /// Annual coupon (e.g. 0.08 for 8%)
    #[arg(long)]
    pub coupon: Option<Decimal>,

    /// Knock-in barrier (e.g. 0.40 for 40%)
    #[arg(long)]
    pub knock_in: Option<Decimal>,
}

impl ProductArgs {
    /// Resolve and validate the product; inline flags win over the file.
    pub fn resolve(&self) -> Result<ProductSpec, Box<dyn std::error::Error>> {
        let base = match self.product.as_deref() {
            Some(path) => load_product(path)?,
            None => ProductSpec::default(),
        };
        let product = self.apply_overrides(base);
        product.validate()?;
        Ok(product)
    }

    fn apply_overrides(&self, mut product: ProductSpec) -> ProductSpec {
        if let Some(m) = self.maturity_months {
            product.maturity_months = m;
        }
        if let Some(i) = self.obs_interval_months {
            product.obs_interval_months = i;
        }
        if let Some(levels) = &self.early_levels {
            product.early_levels = levels.clone();
        }
        if let Some(c) = self.coupon {
            product.coupon_annual = c;
        }
        if let Some(k) = self.knock_in {
            product.knock_in = k;
        }
        product
    }
}

pub fn load_product(path: &str) -> Result<ProductSpec, Box<dyn std::error::Error>> {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("yaml") | Some("yml") => file::read_yaml(path),
        _ => file::read_json(path),
    }
}
