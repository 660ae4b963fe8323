//! Fixed choice lists offered by the submission form.

use crate::error::PredictorError;

pub const MIN_YEAR: i32 = 1990;
pub const MAX_YEAR: i32 = 2024;
/// Year preselected by the form.
pub const DEFAULT_YEAR: i32 = 2018;

pub const BRANDS: &[&str] = &[
    "Toyota",
    "Suzuki",
    "Honda",
    "Daihatsu",
    "Mitsubishi",
    "KIA",
    "Other Brands",
    "Nissan",
    "BMW",
    "Mazda",
    "Chevrolet",
    "Daewoo",
    "Hyundai",
    "FAW",
    "Mercedes",
    "Classic & Antiques",
    "Lexus",
    "Audi",
    "Range Rover",
    "Changan",
    "Porsche",
    "Subaru",
    "Land Rover",
    "Others",
];

pub const CONDITIONS: &[&str] = &["Used", "New"];

pub const FUEL_TYPES: &[&str] = &["Petrol", "Diesel", "Hybrid", "Electric", "Other"];

// Kept sorted; the form shows them in this order.
pub const REGISTERED_CITIES: &[&str] = &[
    "Abbottabad",
    "Ali Masjid",
    "Askoley",
    "Attock",
    "Badin",
    "Bagh",
    "Bahawalnagar",
    "Bahawalpur",
    "Bela",
    "Bhimber",
    "Burewala",
    "Chilas",
    "Chiniot",
    "Chitral",
    "Dera Ghazi Khan",
    "Dera Ismail Khan",
    "Faisalabad",
    "Gujranwala",
    "Gujrat",
    "Haripur",
    "Hyderabad",
    "Islamabad",
    "Jhelum",
    "Kandhura",
    "Karachi",
    "Karak",
    "Kasur",
    "Khairpur",
    "Khanewal",
    "Khanpur",
    "Khaplu",
    "Khushab",
    "Kohat",
    "Lahore",
    "Larkana",
    "Lasbela",
    "Mandi Bahauddin",
    "Mardan",
    "Mirpur",
    "Multan",
    "Muzaffarabad",
    "Muzaffargarh",
    "Nawabshah",
    "Nowshera",
    "Okara",
    "Other",
    "Pakpattan",
    "Peshawar",
    "Quetta",
    "Rahimyar Khan",
    "Rawalpindi",
    "Sahiwal",
    "Sargodha",
    "Sheikhupura",
    "Sialkot",
    "Sukkar",
    "Sukkur",
    "Swabi",
    "Swat",
    "Tank",
    "Vehari",
    "Wah",
];

pub const TRANSACTION_TYPES: &[&str] = &["Cash", "Installment/Leasing", "Other"];

/// Checks that `value` is one of `choices` and returns the canonical entry.
///
/// Matching is exact; the form only ever submits values it was given.
pub fn choose(
    field: &str,
    value: &str,
    choices: &'static [&'static str],
) -> Result<&'static str, PredictorError> {
    choices
        .iter()
        .copied()
        .find(|choice| *choice == value)
        .ok_or_else(|| PredictorError::Validation(format!("Unknown {}: '{}'", field, value)))
}

pub fn check_year(year: i32) -> Result<i32, PredictorError> {
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(year)
    } else {
        Err(PredictorError::Validation(format!(
            "Year must be between {} and {}, got {}",
            MIN_YEAR, MAX_YEAR, year
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_sizes() {
        assert_eq!(BRANDS.len(), 24);
        assert_eq!(CONDITIONS.len(), 2);
        assert_eq!(FUEL_TYPES.len(), 5);
        assert_eq!(REGISTERED_CITIES.len(), 62);
        assert_eq!(TRANSACTION_TYPES.len(), 3);
    }

    #[test]
    fn test_cities_are_sorted() {
        let mut sorted = REGISTERED_CITIES.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, REGISTERED_CITIES);
    }

    #[test]
    fn test_choose_known_value() {
        assert_eq!(choose("brand", "Toyota", BRANDS).unwrap(), "Toyota");
        assert_eq!(
            choose("transaction type", "Installment/Leasing", TRANSACTION_TYPES).unwrap(),
            "Installment/Leasing"
        );
    }

    #[test]
    fn test_choose_unknown_value() {
        let err = choose("fuel", "Steam", FUEL_TYPES).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Unknown fuel: 'Steam'");
    }

    #[test]
    fn test_choose_is_case_sensitive() {
        assert!(choose("condition", "used", CONDITIONS).is_err());
    }

    #[test]
    fn test_year_bounds() {
        assert!(check_year(MIN_YEAR).is_ok());
        assert!(check_year(MAX_YEAR).is_ok());
        assert!(check_year(1989).is_err());
        assert!(check_year(2025).is_err());
    }
}
