//! XP Reward Table
//!
//! Flat XP amounts for product events. The host CRM reports events by name
//! when calling the award endpoint; unknown events fall back to a token
//! 1 XP so new product surfaces never silently award nothing.

/// XP amount for a named product event.
pub fn xp_for_event(event: &str) -> u64 {
    match event {
        "profile_completed" => 50,
        "daily_login" => 5,
        "client_created" => 10,
        "client_follow_up" => 5,
        "project_created" => 15,
        "project_completed" => 75,
        "milestone_completed" => 20,
        "invoice_created" => 10,
        "invoice_sent" => 15,
        "invoice_paid" => 50,
        "expense_logged" => 5,
        "goal_created" => 10,
        "goal_completed" => 60,
        "time_entry_logged" => 5,
        "community_post" => 10,
        "community_comment" => 3,
        _ => 1,
    }
}
