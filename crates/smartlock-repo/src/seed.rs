use rust_decimal::Decimal;
use smartlock_types::domain::product::{NewProduct, ProductCategory};
use smartlock_types::ports::{CatalogRepository, RepoError};

fn features(list: &[&str]) -> Vec<String> {
    list.iter().map(|f| f.to_string()).collect()
}

/// The launch assortment.
pub fn default_catalog() -> Vec<NewProduct> {
    vec![
        NewProduct {
            name: "Smart Fietsslot Pro".into(),
            description: "Revolutionair fietsslot dat je met je smartphone kunt openen. Inclusief alarm en GPS-tracking. Waterdicht en ultra-sterk materiaal.".into(),
            price: Decimal::new(8999, 2),
            image: "/images/fietsslot.png".into(),
            category: ProductCategory::Fietsslot,
            stock: 25,
            features: features(&[
                "Smartphone opening",
                "Alarm functie",
                "GPS tracking",
                "Waterdicht",
                "Ultra-sterk materiaal",
                "Batterij duurt 6 maanden",
            ]),
        },
        NewProduct {
            name: "Smart Kabelslot Secure".into(),
            description: "Flexibel kabelslot met smartphone bediening en alarm. Perfect voor motoren, fietsen en andere voertuigen. Verstelbare kabellengte.".into(),
            price: Decimal::new(7999, 2),
            image: "/images/kettingslot.png".into(),
            category: ProductCategory::Kabelslot,
            stock: 30,
            features: features(&[
                "Smartphone opening",
                "Alarm functie",
                "Verstelbare kabel",
                "Weersbestendig",
                "Lange batterijduur",
                "Bluetooth connectie",
            ]),
        },
        NewProduct {
            name: "Smart Deurslot".into(),
            description: "Flexibel slim deurslot met smartphonebediening en ingebouwd alarm. Ideaal voor schuifdeuren, poorten en toegangshekken.".into(),
            price: Decimal::new(9999, 2),
            image: "/images/product-1752358283661.png".into(),
            category: ProductCategory::Deurslot,
            stock: 20,
            features: features(&["Deurslot", "Smart", "Bluetooth", "Telefoon"]),
        },
    ]
}

/// Inserts [`default_catalog`] when the catalog is empty. Returns how many
/// products were added.
pub async fn seed_default_catalog<R: CatalogRepository + ?Sized>(repo: &R) -> Result<usize, RepoError> {
    if !repo.list_products().await?.is_empty() {
        return Ok(0);
    }
    let products = default_catalog();
    let count = products.len();
    for p in products {
        repo.create_product(p).await?;
    }
    tracing::info!(count, "seeded default catalog");
    Ok(count)
}
