//! Command parser for the : command system

/// Parsed command from user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Navigation commands
    Market,
    Collection,
    Page(usize),
    NextPage,
    PrevPage,

    // Query commands
    Rarity(Option<String>),
    Sort(Option<String>),
    Search(Option<String>),

    // Actions on the selected NFT
    Buy,
    Offer(Option<String>),
    Sell(Option<String>),
    Transfer(Option<String>),
    Tip(Option<String>),
    Like,

    // Offers on the selected owned NFT
    Offers,
    Accept(Option<String>),
    Decline(Option<String>),

    // App
    Refresh,
    Help,
    Quit,

    // Unknown command
    Unknown(String),
}

/// Parse a command string (without the leading :)
pub fn parse_command(input: &str) -> Command {
    let input = input.trim();
    let mut parts = input.splitn(2, ' ');
    let cmd = parts.next().unwrap_or("");
    let args = parts
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    match cmd.to_lowercase().as_str() {
        // Navigation
        "market" | "m" | "home" => Command::Market,
        "mine" | "my" | "collection" | "c" => Command::Collection,
        "page" | "p" => match args.and_then(|s| s.parse().ok()) {
            Some(page) => Command::Page(page),
            None => Command::Unknown(input.to_string()),
        },
        "next" | "n" => Command::NextPage,
        "prev" | "previous" => Command::PrevPage,

        // Query
        "rarity" | "filter" | "r" => Command::Rarity(args),
        "sort" => Command::Sort(args),
        "search" | "find" | "s" => Command::Search(args),

        // Actions
        "buy" | "purchase" => Command::Buy,
        "offer" => Command::Offer(args),
        "sell" | "list" => Command::Sell(args),
        "transfer" | "send" => Command::Transfer(args),
        "tip" | "donate" => Command::Tip(args),
        "like" => Command::Like,

        // Offers
        "offers" => Command::Offers,
        "accept" => Command::Accept(args),
        "decline" | "reject" => Command::Decline(args),

        "refresh" | "reload" => Command::Refresh,
        "help" | "h" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,

        _ => Command::Unknown(input.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_navigation_commands() {
        assert_eq!(parse_command("market"), Command::Market);
        assert_eq!(parse_command("mine"), Command::Collection);
        assert_eq!(parse_command("page 3"), Command::Page(3));
        assert_eq!(
            parse_command("page x"),
            Command::Unknown("page x".to_string())
        );
        assert_eq!(parse_command("next"), Command::NextPage);
        assert_eq!(parse_command("prev"), Command::PrevPage);
    }

    #[test]
    fn test_parse_query_commands() {
        assert_eq!(
            parse_command("rarity super rare"),
            Command::Rarity(Some("super rare".to_string()))
        );
        assert_eq!(parse_command("rarity"), Command::Rarity(None));
        assert_eq!(
            parse_command("sort likes"),
            Command::Sort(Some("likes".to_string()))
        );
        assert_eq!(
            parse_command("search  Golden Dragon "),
            Command::Search(Some("Golden Dragon".to_string()))
        );
        assert_eq!(parse_command("search"), Command::Search(None));
    }

    #[test]
    fn test_parse_action_commands() {
        assert_eq!(parse_command("buy"), Command::Buy);
        assert_eq!(
            parse_command("offer 2.5"),
            Command::Offer(Some("2.5".to_string()))
        );
        assert_eq!(parse_command("sell"), Command::Sell(None));
        assert_eq!(
            parse_command("transfer 0xabc"),
            Command::Transfer(Some("0xabc".to_string()))
        );
        assert_eq!(
            parse_command("tip 0.1"),
            Command::Tip(Some("0.1".to_string()))
        );
        assert_eq!(parse_command("LIKE"), Command::Like);
    }

    #[test]
    fn test_parse_offer_commands() {
        assert_eq!(parse_command("offers"), Command::Offers);
        assert_eq!(parse_command("accept"), Command::Accept(None));
        assert_eq!(
            parse_command("decline 0xb0b"),
            Command::Decline(Some("0xb0b".to_string()))
        );
    }

    #[test]
    fn test_parse_app_commands() {
        assert_eq!(parse_command("refresh"), Command::Refresh);
        assert_eq!(parse_command("help"), Command::Help);
        assert_eq!(parse_command("q"), Command::Quit);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            parse_command("notacommand"),
            Command::Unknown("notacommand".to_string())
        );
    }
}
