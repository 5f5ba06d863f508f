//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the migrations under `backend/migrations`.
//! Regenerate with `diesel print-schema` after changing a migration.

diesel::table! {
    /// Staff accounts.
    users (id) {
        id -> Uuid,
        /// Lower-cased login email, unique.
        email -> Text,
        /// PHC-formatted Argon2id hash.
        password_hash -> Text,
        name -> Text,
        /// `admin` or `verifier`.
        role -> Text,
        is_active -> Bool,
        last_login_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Loan applications.
    ///
    /// A partial unique index on `email` covers rows whose status is
    /// `pending` or `verified`.
    loans (id) {
        id -> Uuid,
        applicant_name -> Text,
        email -> Text,
        phone -> Text,
        amount -> Float8,
        purpose -> Text,
        employment_status -> Text,
        monthly_income -> Float8,
        credit_score -> Nullable<Int4>,
        status -> Text,
        verified_by -> Nullable<Uuid>,
        verified_at -> Nullable<Timestamptz>,
        approved_by -> Nullable<Uuid>,
        approved_at -> Nullable<Timestamptz>,
        rejection_reason -> Nullable<Text>,
        /// JSON array of `{name, url}` objects.
        documents -> Jsonb,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}
