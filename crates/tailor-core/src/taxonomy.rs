//! Fine-grained garment categories collapsed into broad ones.

/// Fine category → broad category.
const BROAD_CATEGORIES: &[(&str, &str)] = &[
    // Lehenga
    ("Fishtail_Lehenga", "Lehenga"),
    ("A-line_Lehenga", "Lehenga"),
    ("Circular_Lehenga", "Lehenga"),
    ("Panelled_Lehenga", "Lehenga"),
    ("Trail_Lehenga", "Lehenga"),
    ("Cape_Lehenga", "Lehenga"),
    ("Jacket_Lehenga", "Lehenga"),
    ("Indo-Western_Lehenga", "Lehenga"),
    ("Lehenga_Choli", "Lehenga"),
    ("Crop_Top_with_Lehenga", "Lehenga"),
    ("Bralette_+_Lehenga_Set", "Lehenga"),
    ("Lehenga", "Lehenga"),
    // Saree
    ("Banarasi_Saree", "Saree"),
    ("Kanjeevaram_Saree", "Saree"),
    ("Bandhani_Saree", "Saree"),
    ("Paithani_Saree", "Saree"),
    ("Chanderi_Saree", "Saree"),
    ("Dhoti_Saree", "Saree"),
    ("Half_Saree", "Saree"),
    ("Pre-stitched_Saree", "Saree"),
    ("Saree_Gown", "Saree"),
    ("Draped_Saree", "Saree"),
    ("Saree_(Generic)", "Saree"),
    ("Saree", "Saree"),
    // Suit, including co-ord sets
    ("Punjabi_Suit", "Suit"),
    ("Patiala_Suit", "Suit"),
    ("Straight_Suit", "Suit"),
    ("Churidar_Suit", "Suit"),
    ("Anarkali_Suit", "Suit"),
    ("Sharara_Suit", "Suit"),
    ("Gharara_Suit", "Suit"),
    ("Palazzo_Suit", "Suit"),
    ("Tulip_Pants_Suit", "Suit"),
    ("Pant_Style_Suit", "Suit"),
    ("Layered_Suit", "Suit"),
    ("Blazer_+_Skirt_Set", "Suit"),
    ("Top_+_Skirt_Set", "Suit"),
    ("Coord_Set_(Generic)", "Suit"),
    ("Indo-Western_Coord_Set", "Suit"),
    ("Suit", "Suit"),
    // Kurti
    ("Peplum_Kurti", "Kurti"),
    ("Angrakha_Kurti", "Kurti"),
    ("Longline_Kurti", "Kurti"),
    ("Kaftan_Kurti", "Kurti"),
    ("A-line_Kurti", "Kurti"),
    ("Cape_Kurti", "Kurti"),
    ("Flared_Kurti", "Kurti"),
    ("Straight_Kurti", "Kurti"),
    ("Kurti", "Kurti"),
    // Gown
    ("Indo-Western_Gown", "Gown"),
    ("One-Shoulder_Gown", "Gown"),
    ("Ruffle_Gown", "Gown"),
    ("Jacket_Gown", "Gown"),
    ("Cape_Gown", "Gown"),
    ("Ethnic_Gown", "Gown"),
    ("Draped_Gown", "Gown"),
    ("Gown", "Gown"),
    // Choli
    ("Chaniya_Choli", "Choli"),
    ("Choli", "Choli"),
    // Regional
    ("Mundum_Neriyathum", "Traditional"),
    ("Mekhela_Sador", "Traditional"),
    ("Traditional", "Traditional"),
    // Cape
    ("Cape_+_Dhoti_Set", "Cape"),
    ("Cape", "Cape"),
    // Kept as-is
    ("Salwar_Kameez", "Salwar_Kameez"),
    ("Others", "Others"),
    ("Electronics", "Electronics"),
    ("Furniture", "Furniture"),
];

/// Map a fine-grained category to its broad category.
///
/// Total: labels missing from the table come back unchanged.
pub fn normalize(fine: &str) -> String {
    broad_category(fine).unwrap_or(fine).to_string()
}

/// Broad category for a known label, `None` when the label is not in the table.
pub fn broad_category(fine: &str) -> Option<&'static str> {
    BROAD_CATEGORIES
        .iter()
        .find(|(k, _)| *k == fine)
        .map(|(_, broad)| *broad)
}

/// Every fine label the table knows about, in table order.
pub fn known_labels() -> impl Iterator<Item = &'static str> {
    BROAD_CATEGORIES.iter().map(|(k, _)| *k)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_examples() {
        assert_eq!(normalize("Fishtail_Lehenga"), "Lehenga");
        assert_eq!(normalize("Anarkali_Suit"), "Suit");
        assert_eq!(normalize("UnknownCategory_X"), "UnknownCategory_X");
    }

    #[test]
    fn test_every_bucket() {
        assert_eq!(normalize("Saree_(Generic)"), "Saree");
        assert_eq!(normalize("Bralette_+_Lehenga_Set"), "Lehenga");
        assert_eq!(normalize("Indo-Western_Coord_Set"), "Suit");
        assert_eq!(normalize("Kaftan_Kurti"), "Kurti");
        assert_eq!(normalize("One-Shoulder_Gown"), "Gown");
        assert_eq!(normalize("Chaniya_Choli"), "Choli");
        assert_eq!(normalize("Mekhela_Sador"), "Traditional");
        assert_eq!(normalize("Cape_+_Dhoti_Set"), "Cape");
        assert_eq!(normalize("Salwar_Kameez"), "Salwar_Kameez");
        assert_eq!(normalize("Others"), "Others");
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert_eq!(normalize("fishtail_lehenga"), "fishtail_lehenga");
        assert_eq!(broad_category("fishtail_lehenga"), None);
    }

    #[test]
    fn test_table_has_no_duplicate_keys() {
        let mut keys: Vec<&str> = known_labels().collect();
        let total = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), total);
    }

    #[test]
    fn test_broad_categories_are_fixed_points() {
        for label in known_labels() {
            let broad = normalize(label);
            assert_eq!(normalize(&broad), broad, "{label}");
        }
    }
}
