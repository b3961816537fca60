use super::{Notification, NotificationEvent, OutboundEmail};

pub fn render(notification: &Notification, from_address: &str) -> OutboundEmail {
    let name = &notification.recipient_name;
    let (subject, body) = match &notification.event {
        NotificationEvent::Registered => (
            "Welcome to BuddyPerks - Registration Received".to_string(),
            format!(
                "Hi {name},\n\nThanks for registering. Your documents are under review \
                 and we will email you once an administrator has verified them."
            ),
        ),
        NotificationEvent::Approved { buddy_id } => (
            "Verification Status Update".to_string(),
            format!(
                "Hi {name},\n\nYour account has been approved. Your Buddy ID is {buddy_id}. \
                 You can now sign in and redeem coupons and discounts."
            ),
        ),
        NotificationEvent::Rejected { reason } => (
            "Verification Status Update".to_string(),
            format!(
                "Hi {name},\n\nUnfortunately your registration was not approved.\n\
                 Reason: {reason}\n\nYou are welcome to apply again."
            ),
        ),
        NotificationEvent::Banned { reason } => (
            "Account Suspension Notice".to_string(),
            format!("Hi {name},\n\nYour account has been suspended.\nReason: {reason}"),
        ),
        NotificationEvent::Unbanned => (
            "Account Restoration Notice".to_string(),
            format!("Hi {name},\n\nYour account has been restored. Welcome back."),
        ),
        NotificationEvent::Deleted => (
            "Account Deletion Confirmation".to_string(),
            format!("Hi {name},\n\nYour account and profile have been deleted."),
        ),
    };

    OutboundEmail {
        from: from_address.to_string(),
        to: notification.recipient_email.clone(),
        subject,
        body,
    }
}
