//! Text and JSON rendering of listing tiles and the cart.

use std::io::{self, Write};

use solemate_storefront::cart::CartView;
use solemate_storefront::listing::ProductTile;

/// Render the product listing.
pub fn tiles<W: Write>(out: &mut W, tiles: &[ProductTile], json: bool) -> io::Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, tiles)?;
        return writeln!(out);
    }

    for tile in tiles {
        let status = if tile.adding { " (adding...)" } else { "" };
        writeln!(
            out,
            "[{:>4}] {:<50} {:>12}  in cart: {}{status}",
            tile.id.as_i32(), tile.title, tile.price, tile.amount
        )?;
    }
    Ok(())
}

/// Render the cart, or the empty-cart message.
pub fn cart<W: Write>(out: &mut W, view: &CartView, json: bool) -> io::Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, view)?;
        return writeln!(out);
    }

    if view.is_empty() {
        writeln!(out, "Your cart is empty.")?;
        return writeln!(out, "Add products with `add <id>`; `products` lists them.");
    }

    for item in &view.items {
        let status = if item.pending { " (updating...)" } else { "" };
        writeln!(
            out,
            "[{:>4}] {:<40} {:>12} x {:<3} = {:>12}{status}",
            item.product_id.as_i32(), item.title, item.price, item.quantity, item.subtotal
        )?;
    }
    writeln!(out, "TOTAL ({} items): {}", view.item_count, view.total)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use solemate_core::{CurrencyCode, ProductId};
    use solemate_storefront::cart::CartLineView;

    use super::*;

    fn render_cart(view: &CartView, json: bool) -> String {
        let mut out = Vec::new();
        cart(&mut out, view, json).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_empty_cart_message() {
        let text = render_cart(&CartView::empty(CurrencyCode::BRL), false);
        assert!(text.starts_with("Your cart is empty."));
    }

    #[test]
    fn test_cart_lines_and_total() {
        let view = CartView {
            items: vec![CartLineView {
                product_id: ProductId::new(1),
                title: "Shoe".to_string(),
                image: String::new(),
                price: "R$100.00".to_string(),
                quantity: 2,
                subtotal: "R$200.00".to_string(),
                pending: false,
            }],
            total: "R$200.00".to_string(),
            item_count: 2,
        };
        let text = render_cart(&view, false);
        assert!(text.contains("Shoe"));
        assert!(text.contains("TOTAL (2 items): R$200.00"));
        assert!(!text.contains("updating"));

        let json: serde_json::Value = serde_json::from_str(&render_cart(&view, true)).unwrap();
        assert_eq!(json["total"], "R$200.00");
        assert_eq!(json["items"][0]["product_id"], 1);
    }

    #[test]
    fn test_tiles_mark_adding() {
        let tile = ProductTile {
            id: ProductId::new(3),
            title: "Boot".to_string(),
            image: String::new(),
            price: "R$50.00".to_string(),
            amount: 0,
            adding: true,
        };
        let mut out = Vec::new();
        tiles(&mut out, &[tile], false).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("(adding...)"));
        assert!(text.contains("in cart: 0"));
    }
}
