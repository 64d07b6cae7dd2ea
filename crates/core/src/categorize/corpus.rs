use crate::domain::transaction::Category;
use crate::model::LabelledText;

const NEEDS: &[&str] = &[
    "Monthly Rent Payment",
    "Electricity Bill BESCOM",
    "Water Bill Corporation",
    "Groceries BigBasket",
    "Home Loan EMI HDFC",
    "Medical Insurance Premium",
    "LPG Gas Cylinder",
    "BMTC Bus Pass",
    "College Fee Payment",
    "Medicine Apollo Pharmacy",
    "Airtel Broadband Bill",
    "Jio Mobile Recharge",
    "Car Insurance Renewal",
    "DMart Essential Shopping",
    "Namma Metro Card",
    "School Fees",
    "Loan Payment Bank",
    "Utility Bill Payment",
    "Medical Consultation",
    "Grocery Store",
    "RENT APRIL 2024",
    "ELECTRICITY MARCH",
    "EMERGENCY MEDICAL",
    "DEPARTMENTAL STORE",
    "PETROL PUMP",
    "MAINTENANCE CHARGES",
];

const WANTS: &[&str] = &[
    "Swiggy Food Delivery",
    "Zomato Dinner Order",
    "Netflix Monthly Plan",
    "Amazon Prime Shopping",
    "Myntra Fashion Sale",
    "PVR Cinema Tickets",
    "Starbucks Coffee Date",
    "Dominos Pizza Weekend",
    "BookMyShow Event",
    "Flipkart Electronics",
    "Uber Cab Ride",
    "OYO Hotel Booking",
    "Salon Treatment",
    "Steam Game Purchase",
    "Restaurant Fine Dining",
    "Spotify Premium",
    "Gaming Console",
    "Designer Clothes",
    "Luxury Watch",
    "Weekend Getaway",
    "FOOD PANDA DELIVERY",
    "ONLINE SHOPPING SALE",
    "CAB OFFICE TRAVEL",
    "RESTAURANT BILL",
    "ENTERTAINMENT EXPENSE",
];

const SAVINGS: &[&str] = &[
    "HDFC Fixed Deposit",
    "SIP Mutual Fund ICICI",
    "Zerodha Stock Purchase",
    "Recurring Deposit SBI",
    "PPF Annual Contribution",
    "NPS Tier 1 Investment",
    "Digital Gold Paytm",
    "Bitcoin Crypto Investment",
    "Retirement Fund ICICI",
    "Child Education Plan",
    "ELSS Tax Saving Fund",
    "Corporate Bond",
    "Equity Mutual Fund",
    "Index Fund Investment",
    "Emergency Fund Transfer",
    "Gold ETF Purchase",
    "Real Estate Investment",
    "Insurance Investment Plan",
    "Pension Fund",
    "Wealth Management",
    "MONTHLY SIP HDFC",
    "FD MATURITY REINVEST",
    "MUTUAL FUND SIP",
    "INVESTMENT PORTFOLIO",
];

/// Hand-labelled transactions used when no sample file is configured.
pub fn labelled_transactions() -> Vec<LabelledText> {
    let mut out = Vec::with_capacity(NEEDS.len() + WANTS.len() + SAVINGS.len());
    for (category, descriptions) in [
        (Category::Needs, NEEDS),
        (Category::Wants, WANTS),
        (Category::Savings, SAVINGS),
    ] {
        out.extend(
            descriptions
                .iter()
                .map(|d| LabelledText::new(*d, category)),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corpus_covers_every_spending_category() {
        let corpus = labelled_transactions();
        assert_eq!(corpus.len(), 75);
        for cat in [Category::Needs, Category::Wants, Category::Savings] {
            assert!(corpus.iter().filter(|s| s.category == cat).count() >= 20);
        }
    }
}
