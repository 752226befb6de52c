//! Address book commands.

use clap::Args;

use bazaar_core::{AddressFields, AddressKind};
use bazaar_storefront::Storefront;
use bazaar_storefront::services::addresses::NewAddress;

use super::{CliError, Result};

/// Address fields as command-line options.
#[derive(Debug, Clone, Args)]
pub struct AddressArgs {
    /// Address label (`home`, `office`, `other`)
    #[arg(long = "type", default_value = "home")]
    pub kind: String,

    #[arg(long)]
    pub street: Option<String>,

    #[arg(long)]
    pub apartment: Option<String>,

    #[arg(long)]
    pub city: Option<String>,

    #[arg(long)]
    pub state: Option<String>,

    #[arg(long)]
    pub postal_code: Option<String>,

    #[arg(long, default_value = "India")]
    pub country: String,

    /// Make this the default address
    #[arg(long = "default")]
    pub make_default: bool,
}

impl AddressArgs {
    /// Whether any address field was given.
    #[must_use]
    pub fn is_given(&self) -> bool {
        self.street.is_some() || self.city.is_some() || self.postal_code.is_some()
    }

    /// Convert to a new address. Missing fields are left blank for the
    /// address book to report.
    pub fn into_new_address(self) -> Result<NewAddress> {
        let kind = self.kind.parse::<AddressKind>().map_err(CliError::Input)?;
        Ok(NewAddress {
            kind,
            fields: AddressFields {
                street: self.street.unwrap_or_default(),
                apartment: self.apartment.filter(|a| !a.trim().is_empty()),
                city: self.city.unwrap_or_default(),
                state: self.state.unwrap_or_default(),
                postal_code: self.postal_code.unwrap_or_default(),
                country: self.country,
            },
            make_default: self.make_default,
        })
    }
}

pub fn add(storefront: &Storefront, args: AddressArgs) -> Result<()> {
    let address = storefront.addresses().add(args.into_new_address()?)?;
    println!("Saved address {}", address.id);
    Ok(())
}

pub fn list(storefront: &Storefront) -> Result<()> {
    let addresses = storefront.addresses().list()?;
    if addresses.is_empty() {
        println!("No saved addresses");
    }
    for address in addresses {
        println!(
            "{}{} [{:?}] {}",
            address.id,
            if address.is_default { " (default)" } else { "" },
            address.kind,
            address.fields.one_line()
        );
    }
    Ok(())
}
