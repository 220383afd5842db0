/// 알림 메일 템플릿
// region:    --- Imports
use super::EmailMessage;
use crate::user::Contact;

// endregion: --- Imports

// region:    --- Auction Templates
/// 경매 종료 - 판매자에게 낙찰자 안내
pub fn auction_ended_for_seller(
    from: &str,
    listing_id: &str,
    seller: &Contact,
    bidder: &Contact,
) -> EmailMessage {
    EmailMessage {
        from: from.to_string(),
        to: seller.email.clone(),
        subject: "Your Listing Bid Has Ended".to_string(),
        body: format!(
            "Hello {},\n\nYour listing ({}) bidding period has ended.\n\
             The winning bidder is:\nName: {}\nEmail: {}\n\n\
             Please contact them for the next steps.",
            seller.name, listing_id, bidder.name, bidder.email
        ),
    }
}

/// 경매 종료 - 낙찰자에게 판매자 안내
pub fn auction_won_for_bidder(
    from: &str,
    listing_id: &str,
    seller: &Contact,
    bidder: &Contact,
) -> EmailMessage {
    EmailMessage {
        from: from.to_string(),
        to: bidder.email.clone(),
        subject: "Congratulations, You Won the Bid!".to_string(),
        body: format!(
            "Hello {},\n\nCongratulations! Your bid on listing ({}) has won.\n\n\
             The seller's contact details are:\nName: {}\nEmail: {}\n\n\
             Please contact the seller to proceed.",
            bidder.name, listing_id, seller.name, seller.email
        ),
    }
}
// endregion: --- Auction Templates

// region:    --- Order Templates
/// 구매자 주문 안내 (상품별 판매자 연락처)
pub fn order_for_buyer(
    from: &str,
    buyer_email: &str,
    item_lines: &[String],
    shipping_address: &str,
) -> EmailMessage {
    let mut body =
        String::from("Thank you for your purchase! Here is the contact info for the sellers:\n\n");
    for line in item_lines {
        body.push_str(line);
        body.push('\n');
    }
    body.push_str(&format!("\nYour Shipping Address: {shipping_address}\n"));

    EmailMessage {
        from: from.to_string(),
        to: buyer_email.to_string(),
        subject: "Your Purchase Order Details".to_string(),
        body,
    }
}

/// 판매자 판매 안내
pub fn order_for_seller(
    from: &str,
    seller_email: &str,
    item_lines: &[String],
    shipping_address: &str,
) -> EmailMessage {
    let mut body = String::from("The following items of yours were purchased:\n\n");
    for line in item_lines {
        body.push_str(line);
        body.push('\n');
    }
    body.push_str(&format!("\nBuyer's Shipping Address: {shipping_address}\n"));

    EmailMessage {
        from: from.to_string(),
        to: seller_email.to_string(),
        subject: "Your Items Have Been Purchased".to_string(),
        body,
    }
}
// endregion: --- Order Templates

// region:    --- Report Template
pub fn report(from: &str, recipient: &str, category: &str, flag: &str, body: &str) -> EmailMessage {
    EmailMessage {
        from: from.to_string(),
        to: recipient.to_string(),
        subject: format!("{category} - {flag}"),
        body: body.to_string(),
    }
}
// endregion: --- Report Template

#[cfg(test)]
mod tests {
    use super::*;

    fn sam() -> Contact {
        Contact {
            name: "Sam".to_string(),
            email: "s@x.com".to_string(),
        }
    }

    fn bo() -> Contact {
        Contact {
            name: "Bo".to_string(),
            email: "b@x.com".to_string(),
        }
    }

    #[test]
    fn seller_message_names_the_winner() {
        let message = auction_ended_for_seller("noreply@x.com", "L1", &sam(), &bo());
        assert_eq!(message.to, "s@x.com");
        assert_eq!(
            message.body,
            "Hello Sam,\n\nYour listing (L1) bidding period has ended.\n\
             The winning bidder is:\nName: Bo\nEmail: b@x.com\n\n\
             Please contact them for the next steps."
        );
    }

    #[test]
    fn bidder_message_names_the_seller() {
        let message = auction_won_for_bidder("noreply@x.com", "L1", &sam(), &bo());
        assert_eq!(message.to, "b@x.com");
        assert_eq!(message.subject, "Congratulations, You Won the Bid!");
        assert!(message.body.contains("Name: Sam\nEmail: s@x.com"));
    }

    #[test]
    fn order_messages_end_with_shipping_address() {
        let lines = vec!["Lamp: Contact seller at s@x.com".to_string()];
        let buyer = order_for_buyer("noreply@x.com", "b@x.com", &lines, "1 Main St");
        assert_eq!(
            buyer.body,
            "Thank you for your purchase! Here is the contact info for the sellers:\n\n\
             Lamp: Contact seller at s@x.com\n\nYour Shipping Address: 1 Main St\n"
        );

        let seller = order_for_seller("noreply@x.com", "s@x.com", &lines, "1 Main St");
        assert!(seller.body.ends_with("Buyer's Shipping Address: 1 Main St\n"));
    }

    #[test]
    fn report_subject_joins_category_and_flag() {
        let message = report("noreply@x.com", "ops@x.com", "Abuse", "High", "details");
        assert_eq!(message.subject, "Abuse - High");
        assert_eq!(message.body, "details");
    }
}
