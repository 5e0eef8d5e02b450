pub mod eventbrite;
pub mod supabase_rest;
pub mod sync_state;
