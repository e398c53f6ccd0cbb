//! Fixed instruction text and response schema for statement extraction.

use crate::wire::{Schema, SchemaType};

pub const EXTRACTION_PROMPT: &str = "You are an intelligent document processing agent specializing in financial statements. \
Your task is to analyze the provided bank statement image(s) and meticulously extract all transaction details. \
For each row in the transaction table, extract the date, particulars/description, payments (debits/withdrawals), \
receipts (credits/deposits), and the running balance. \
Ignore headers, footers, and summary sections like 'TOTAL DEPOSITS'. \
Return the data as a JSON array of objects, strictly adhering to the provided schema. \
If a payment or receipt column is empty for a transaction, use a value of null. \
Clean the data by removing currency symbols and commas from numbers. \
Ensure the final balance string includes 'Dr' or 'Cr' if present.";

/// Array of statement rows: `date`, `particulars`, `balance` required;
/// `payments`/`receipts` nullable numbers.
pub fn transaction_schema() -> Schema {
    let row = Schema::new(SchemaType::Object)
        .property(
            "date",
            Schema::new(SchemaType::String).describe("Transaction date (e.g., DD/MM/YY)"),
        )
        .property(
            "particulars",
            Schema::new(SchemaType::String)
                .describe("Description or particulars of the transaction"),
        )
        .property(
            "payments",
            Schema::new(SchemaType::Number)
                .nullable()
                .describe("Payment/Debit amount, null if not present"),
        )
        .property(
            "receipts",
            Schema::new(SchemaType::Number)
                .nullable()
                .describe("Receipt/Credit amount, null if not present"),
        )
        .property(
            "balance",
            Schema::new(SchemaType::String).describe("Running balance after the transaction"),
        )
        .require(["date", "particulars", "balance"]);

    Schema::array_of(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prompt_covers_extraction_rules() {
        for needle in [
            "particulars",
            "running balance",
            "TOTAL DEPOSITS",
            "null",
            "currency symbols and commas",
            "'Dr' or 'Cr'",
        ] {
            assert!(EXTRACTION_PROMPT.contains(needle), "prompt missing {needle:?}");
        }
    }

    #[test]
    fn test_schema_shape() {
        let v = serde_json::to_value(transaction_schema()).unwrap();
        assert_eq!(v["type"], "ARRAY");
        assert_eq!(v["items"]["type"], "OBJECT");
        assert_eq!(v["items"]["required"], json!(["date", "particulars", "balance"]));
        assert_eq!(
            v["items"]["propertyOrdering"],
            json!(["date", "particulars", "payments", "receipts", "balance"])
        );

        let props = &v["items"]["properties"];
        assert_eq!(props["date"]["type"], "STRING");
        assert_eq!(props["balance"]["type"], "STRING");
        assert_eq!(props["payments"]["type"], "NUMBER");
        assert_eq!(props["payments"]["nullable"], true);
        assert_eq!(props["receipts"]["nullable"], true);
        assert!(props["date"].get("nullable").is_none());
    }
}
