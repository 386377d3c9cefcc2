//! Interactive cart session.
//!
//! Reads one command per line from stdin and prints the cart after every
//! change. Rejected commands print a short message and the session carries on.

use std::io::{self, Write};
use std::str::FromStr;

use solemate_core::ProductId;
use solemate_storefront::StorefrontConfig;
use solemate_storefront::cart::{CartError, CartStore};
use solemate_storefront::catalog::ProductCatalog;
use solemate_storefront::error::{StorefrontError, add_breadcrumb, report};
use solemate_storefront::listing::ProductListing;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::render;

const HELP: &str = "\
Commands:
  products          list products with their cart amounts
  add <id>          add one unit of a product
  set <id> <qty>    set a product's quantity
  inc <id>          one more unit
  dec <id>          one less unit
  remove <id>       remove a product from the cart
  show              print the cart
  clear             empty the cart
  help              this text
  quit              leave";

/// A parsed session command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Products,
    Add(ProductId),
    Set(ProductId, i64),
    Inc(ProductId),
    Dec(ProductId),
    Remove(ProductId),
    Show,
    Clear,
    Help,
    Quit,
}

/// Why a line could not be parsed as a [`SessionCommand`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseCommandError {
    #[error("unknown command `{0}`, type `help` for a list")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("invalid product id `{0}`")]
    InvalidId(String),
    #[error("invalid quantity `{0}`")]
    InvalidQuantity(String),
}

impl FromStr for SessionCommand {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let name = words.next().unwrap_or_default().to_ascii_lowercase();
        let args: Vec<&str> = words.collect();

        let id = |usage: &'static str| -> Result<ProductId, ParseCommandError> {
            match args.as_slice() {
                [id] => id
                    .parse()
                    .map_err(|_| ParseCommandError::InvalidId((*id).to_string())),
                _ => Err(ParseCommandError::Usage(usage)),
            }
        };

        match name.as_str() {
            "products" | "ls" => Ok(Self::Products),
            "add" => id("add <id>").map(Self::Add),
            "inc" | "+" => id("inc <id>").map(Self::Inc),
            "dec" | "-" => id("dec <id>").map(Self::Dec),
            "remove" | "rm" => id("remove <id>").map(Self::Remove),
            "set" => match args.as_slice() {
                [id, qty] => {
                    let id = id
                        .parse()
                        .map_err(|_| ParseCommandError::InvalidId((*id).to_string()))?;
                    let qty = qty
                        .parse()
                        .map_err(|_| ParseCommandError::InvalidQuantity((*qty).to_string()))?;
                    Ok(Self::Set(id, qty))
                }
                _ => Err(ParseCommandError::Usage("set <id> <qty>")),
            },
            "show" | "cart" => Ok(Self::Show),
            "clear" => Ok(Self::Clear),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            _ => Err(ParseCommandError::Unknown(name)),
        }
    }
}

/// One shopper's session: a cart and the listing it is shown against.
pub struct Session<'a> {
    cart: CartStore,
    listing: ProductListing,
    catalog: &'a dyn ProductCatalog,
    json: bool,
}

impl<'a> Session<'a> {
    /// Start a session with an empty cart.
    pub fn new(catalog: &'a dyn ProductCatalog, config: &StorefrontConfig, json: bool) -> Self {
        Self {
            cart: CartStore::new(config.cart),
            listing: ProductListing::new(config.currency),
            catalog,
            json,
        }
    }

    /// Load the product listing, reporting a failure without ending the session.
    async fn load_listing<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        if let Err(e) = self.listing.load(self.catalog).await {
            let err = StorefrontError::from(e);
            report(&err);
            writeln!(out, "! {}", err.user_message())?;
        }
        Ok(())
    }

    /// Run one command and print its outcome.
    pub async fn execute<W: Write>(&mut self, command: SessionCommand, out: &mut W) -> io::Result<()> {
        add_breadcrumb("cart", &format!("{command:?}"), None);

        match command {
            SessionCommand::Products => {
                if self.listing.products().is_empty() {
                    self.load_listing(out).await?;
                }
                return render::tiles(out, &self.listing.tiles(&self.cart), self.json);
            }
            SessionCommand::Add(id) => match self.cart.add_to_cart(id, self.catalog).await {
                Ok(line) => writeln!(out, "Added {} (x{})", line.title, line.quantity)?,
                Err(e) => return show_error(out, e),
            },
            SessionCommand::Set(id, qty) => {
                if let Err(e) = self.cart.update_amount(id, qty) {
                    return show_error(out, e);
                }
            }
            SessionCommand::Inc(id) => {
                if let Err(e) = self.cart.increment(id) {
                    return show_error(out, e);
                }
            }
            SessionCommand::Dec(id) => {
                if let Err(e) = self.cart.decrement(id) {
                    return show_error(out, e);
                }
            }
            SessionCommand::Remove(id) => {
                if !self.cart.remove_from_cart(id) {
                    writeln!(out, "Product {id} was not in your cart.")?;
                }
            }
            SessionCommand::Clear => self.cart.clear(),
            SessionCommand::Show => {}
            SessionCommand::Help => return writeln!(out, "{HELP}"),
            SessionCommand::Quit => return Ok(()),
        }

        render::cart(out, &self.cart.view(), self.json)
    }

    /// End the session, discarding the cart.
    pub fn end(self) {
        self.cart.clear();
    }
}

fn show_error<W: Write>(out: &mut W, err: CartError) -> io::Result<()> {
    let product_id = err.product_id();
    let err = StorefrontError::from(err);
    report(&err);
    writeln!(out, "! {} (product {product_id})", err.user_message())
}

/// Run an interactive session until `quit` or end of input.
///
/// # Errors
///
/// Returns an error if stdin or stdout fail.
pub async fn session(
    catalog: &dyn ProductCatalog,
    config: &StorefrontConfig,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut out = io::stdout();
    let mut session = Session::new(catalog, config, json);
    session.load_listing(&mut out).await?;
    writeln!(out, "Type `help` for commands.")?;
    out.flush()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.parse::<SessionCommand>() {
            Ok(SessionCommand::Quit) => break,
            Ok(command) => session.execute(command, &mut out).await?,
            Err(e) => writeln!(out, "! {e}")?,
        }
        out.flush()?;
    }

    session.end();
    Ok(())
}
