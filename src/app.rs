use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::config::MarketConfig;
use crate::core::{Action, Command, NavigateTarget, NotifyLevel};
use crate::domain::{
    page_count, paginate, parse_amount, truncate_address, CategoryFilter, FetchSequencer,
    ListingQuery, Nft, Offer, SortKey,
};
use crate::infrastructure::market::{EntryOperation, OperationKey, OperationKind};
use crate::infrastructure::runtime::{FetchTarget, RuntimeCommand, RuntimeEvent};

const STATUS_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Screen {
    Market,
    Collection,
}

impl Screen {
    pub fn title(&self) -> &'static str {
        match self {
            Screen::Market => "Marketplace",
            Screen::Collection => "My Collection",
        }
    }

    pub fn shortcut(&self) -> char {
        match self {
            Screen::Market => '1',
            Screen::Collection => '2',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Command,
    Prompt(PromptKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Search,
    Offer,
    Sell,
    Transfer,
    Tip,
    ConfirmBuy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Warn,
    Error,
}

impl From<NotifyLevel> for StatusLevel {
    fn from(level: NotifyLevel) -> Self {
        match level {
            NotifyLevel::Info => StatusLevel::Info,
            NotifyLevel::Warn => StatusLevel::Warn,
            NotifyLevel::Error => StatusLevel::Error,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct CommandBar {
    pub input: String,
    pub last: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
    pub since: Instant,
}

/// Snapshot, query and paging of one screen
#[derive(Debug, Clone)]
pub struct ScreenState {
    pub records: Vec<Nft>,
    pub query: ListingQuery,
    /// 1-based
    pub page: usize,
    /// Row within the current page
    pub selected: usize,
    pub fetch: FetchSequencer,
    pub loaded: bool,
    /// Records (market) or owned ids (collection) the node reported
    pub total: usize,
    pub skipped: usize,
    pub loaded_at: Option<DateTime<Local>>,
}

impl Default for ScreenState {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            query: ListingQuery::default(),
            page: 1,
            selected: 0,
            fetch: FetchSequencer::default(),
            loaded: false,
            total: 0,
            skipped: 0,
            loaded_at: None,
        }
    }
}

impl ScreenState {
    /// Filtered and sorted records
    pub fn view(&self) -> Vec<&Nft> {
        self.query.apply(&self.records)
    }

    /// Latest requested fetch has not been answered yet
    pub fn is_loading(&self) -> bool {
        self.fetch.is_pending()
    }

    pub fn page_items(&self, page_size: usize) -> Vec<&Nft> {
        let view = self.view();
        paginate(&view, self.page, page_size).to_vec()
    }

    pub fn page_count(&self, page_size: usize) -> usize {
        page_count(self.view().len(), page_size)
    }

    pub fn selected_nft(&self, page_size: usize) -> Option<&Nft> {
        self.page_items(page_size).get(self.selected).copied()
    }

    fn reset_page(&mut self) {
        self.page = 1;
        self.selected = 0;
    }

    fn apply_snapshot(&mut self, nfts: Vec<Nft>, total: usize, skipped: usize) {
        self.records = nfts;
        self.total = total;
        self.skipped = skipped;
        self.loaded = true;
        self.loaded_at = Some(Local::now());
        self.reset_page();
    }
}

/// Offers on one owned NFT
#[derive(Debug, Clone)]
pub struct OffersPanel {
    pub nft_id: u64,
    pub nft_name: String,
    pub offers: Vec<Offer>,
    pub selected: usize,
    pub loading: bool,
}

impl OffersPanel {
    pub fn selected_offer(&self) -> Option<&Offer> {
        self.offers.get(self.selected)
    }
}

pub struct App {
    pub config: MarketConfig,
    pub screen: Screen,
    pub market: ScreenState,
    pub collection: ScreenState,
    pub offers: Option<OffersPanel>,
    offers_fetch: FetchSequencer,
    pub input_mode: InputMode,
    pub command: CommandBar,
    /// NFT the open prompt acts on
    pub prompt_target: Option<u64>,
    pub show_help: bool,
    pub status: Option<StatusMessage>,
    /// Submitted operations awaiting resolution, with the screen to refetch
    pub pending_ops: BTreeMap<OperationKey, Screen>,
    outbox: Vec<RuntimeCommand>,
    /// Node and wallet the worker reported on startup
    pub endpoints: Option<(String, String)>,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: MarketConfig) -> Self {
        let mut app = Self {
            config,
            screen: Screen::Market,
            market: ScreenState::default(),
            collection: ScreenState::default(),
            offers: None,
            offers_fetch: FetchSequencer::default(),
            input_mode: InputMode::Normal,
            command: CommandBar::default(),
            prompt_target: None,
            show_help: false,
            status: None,
            pending_ops: BTreeMap::new(),
            outbox: Vec::new(),
            endpoints: None,
            should_quit: false,
        };
        app.request_fetch(Screen::Market);
        app
    }

    pub fn page_size(&self) -> usize {
        self.config.page_size
    }

    pub fn screen_state(&self, screen: Screen) -> &ScreenState {
        match screen {
            Screen::Market => &self.market,
            Screen::Collection => &self.collection,
        }
    }

    fn screen_state_mut(&mut self, screen: Screen) -> &mut ScreenState {
        match screen {
            Screen::Market => &mut self.market,
            Screen::Collection => &mut self.collection,
        }
    }

    pub fn current(&self) -> &ScreenState {
        self.screen_state(self.screen)
    }

    fn current_mut(&mut self) -> &mut ScreenState {
        self.screen_state_mut(self.screen)
    }

    pub fn selected_nft(&self) -> Option<&Nft> {
        self.current().selected_nft(self.page_size())
    }

    /// Commands queued for the runtime since the last call
    pub fn take_commands(&mut self) -> Vec<RuntimeCommand> {
        std::mem::take(&mut self.outbox)
    }

    // ---- status ----

    pub fn set_status(&mut self, text: impl Into<String>, level: StatusLevel) {
        self.status = Some(StatusMessage {
            text: text.into(),
            level,
            since: Instant::now(),
        });
    }

    pub fn status_text(&self) -> Option<(&str, StatusLevel)> {
        self.status
            .as_ref()
            .map(|status| (status.text.as_str(), status.level))
    }

    pub fn on_tick(&mut self) {
        if let Some(status) = self.status.as_ref() {
            if status.since.elapsed() > STATUS_TTL {
                self.status = None;
            }
        }
    }

    // ---- fetching ----

    /// Queue a fresh read for `screen`; its response supersedes any in flight
    pub fn request_fetch(&mut self, screen: Screen) {
        if screen == Screen::Collection && self.config.account.is_none() {
            self.set_status(
                "No account configured (set `account` or pass --account)",
                StatusLevel::Warn,
            );
            return;
        }
        let state = self.screen_state_mut(screen);
        let seq = state.fetch.issue();
        let command = match screen {
            Screen::Market => RuntimeCommand::FetchMarket { seq },
            Screen::Collection => RuntimeCommand::FetchCollection { seq },
        };
        tracing::debug!(?screen, seq, "fetch requested");
        self.outbox.push(command);
    }

    pub fn refresh(&mut self) {
        self.request_fetch(self.screen);
        if let Some(nft_id) = self.offers.as_ref().map(|panel| panel.nft_id) {
            self.request_offers(nft_id);
        }
        self.set_status(format!("Refreshing {}…", self.screen.title()), StatusLevel::Info);
    }

    fn request_offers(&mut self, nft_id: u64) {
        let seq = self.offers_fetch.issue();
        if let Some(panel) = self.offers.as_mut() {
            panel.loading = true;
        }
        self.outbox.push(RuntimeCommand::FetchOffers { seq, nft_id });
    }

    pub fn apply_runtime_event(&mut self, event: RuntimeEvent) {
        match event {
            RuntimeEvent::Ready { node, wallet } => {
                tracing::info!(%node, %wallet, "runtime ready");
                self.endpoints = Some((node, wallet));
            }
            RuntimeEvent::MarketLoaded {
                seq,
                nfts,
                total,
                skipped,
            } => self.apply_snapshot(Screen::Market, seq, nfts, total, skipped),
            RuntimeEvent::CollectionLoaded {
                seq,
                nfts,
                total_ids,
                skipped,
            } => self.apply_snapshot(Screen::Collection, seq, nfts, total_ids, skipped),
            RuntimeEvent::OffersLoaded {
                seq,
                nft_id,
                offers,
            } => {
                if !self.offers_fetch.accept(seq) {
                    tracing::debug!(seq, nft_id, "discarding stale offers");
                    return;
                }
                if let Some(panel) = self.offers.as_mut().filter(|p| p.nft_id == nft_id) {
                    panel.offers = offers;
                    panel.loading = false;
                    panel.selected = panel.selected.min(panel.offers.len().saturating_sub(1));
                }
            }
            RuntimeEvent::FetchFailed {
                target,
                seq,
                message,
            } => self.apply_fetch_failure(target, seq, message),
            RuntimeEvent::OperationSubmitted { key, hash } => {
                self.set_status(
                    format!(
                        "{} submitted ({}), waiting for confirmation…",
                        key,
                        truncate_address(&hash)
                    ),
                    StatusLevel::Info,
                );
            }
            RuntimeEvent::OperationConfirmed { key, hash } => {
                let origin = self.pending_ops.remove(&key).unwrap_or(self.screen);
                tracing::info!(op = %key, %hash, "operation confirmed");
                self.set_status(format!("{} confirmed", key), StatusLevel::Success);
                self.request_fetch(origin);
                if matches!(
                    key.kind,
                    OperationKind::AcceptOffer | OperationKind::DeclineOffer
                ) && self.offers.as_ref().map(|p| p.nft_id) == Some(key.nft_id)
                {
                    self.request_offers(key.nft_id);
                }
            }
            RuntimeEvent::OperationFailed { key, message } => {
                self.pending_ops.remove(&key);
                self.set_status(format!("{} failed: {}", key, message), StatusLevel::Error);
            }
            RuntimeEvent::Error { message } => {
                self.set_status(message, StatusLevel::Error);
            }
        }
    }

    fn apply_snapshot(
        &mut self,
        screen: Screen,
        seq: u64,
        nfts: Vec<Nft>,
        total: usize,
        skipped: usize,
    ) {
        let state = self.screen_state_mut(screen);
        if !state.fetch.accept(seq) {
            tracing::debug!(?screen, seq, "discarding stale snapshot");
            return;
        }
        state.apply_snapshot(nfts, total, skipped);
        if skipped > 0 {
            self.set_status(
                format!("{} record(s) could not be decoded and were skipped", skipped),
                StatusLevel::Warn,
            );
        }
    }

    fn apply_fetch_failure(&mut self, target: FetchTarget, seq: u64, message: String) {
        match target {
            FetchTarget::Market | FetchTarget::Collection => {
                let screen = if target == FetchTarget::Market {
                    Screen::Market
                } else {
                    Screen::Collection
                };
                let state = self.screen_state_mut(screen);
                if !state.fetch.accept(seq) {
                    return;
                }
                self.set_status(
                    format!("Failed to load {}: {}", screen.title(), message),
                    StatusLevel::Error,
                );
            }
            FetchTarget::Offers { .. } => {
                if !self.offers_fetch.accept(seq) {
                    return;
                }
                if let Some(panel) = self.offers.as_mut() {
                    panel.loading = false;
                }
                self.set_status(format!("Failed to load offers: {}", message), StatusLevel::Error);
            }
        }
    }

    // ---- navigation and query ----

    pub fn switch_screen(&mut self, screen: Screen) {
        self.screen = screen;
        self.offers = None;
        self.request_fetch(screen);
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        let state = self.current_mut();
        state.query.category = category;
        state.reset_page();
    }

    pub fn cycle_category(&mut self) {
        let next = self.current().query.category.next();
        self.set_category(next);
        self.set_status(format!("Rarity: {}", next.label()), StatusLevel::Info);
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        let state = self.current_mut();
        state.query.sort = sort;
        state.reset_page();
    }

    pub fn cycle_sort(&mut self) {
        let next = self.current().query.sort.next();
        self.set_sort(next);
        self.set_status(format!("Sort: {}", next.label()), StatusLevel::Info);
    }

    pub fn set_search(&mut self, text: &str) {
        let state = self.current_mut();
        state.query.search = text.trim().to_string();
        state.reset_page();
    }

    pub fn next_page(&mut self) {
        let pages = self.current().page_count(self.page_size());
        let state = self.current_mut();
        if state.page < pages {
            state.page += 1;
            state.selected = 0;
        }
    }

    pub fn prev_page(&mut self) {
        let state = self.current_mut();
        if state.page > 1 {
            state.page -= 1;
            state.selected = 0;
        }
    }

    pub fn goto_page(&mut self, page: usize) -> bool {
        let pages = self.current().page_count(self.page_size());
        if page == 0 || page > pages.max(1) {
            return false;
        }
        let state = self.current_mut();
        state.page = page;
        state.selected = 0;
        true
    }

    pub fn move_selection_up(&mut self) {
        if let Some(panel) = self.offers.as_mut() {
            panel.selected = panel.selected.saturating_sub(1);
            return;
        }
        let state = self.current_mut();
        state.selected = state.selected.saturating_sub(1);
    }

    pub fn move_selection_down(&mut self) {
        if let Some(panel) = self.offers.as_mut() {
            if panel.selected + 1 < panel.offers.len() {
                panel.selected += 1;
            }
            return;
        }
        let rows = self.current().page_items(self.page_size()).len();
        let state = self.current_mut();
        if state.selected + 1 < rows {
            state.selected += 1;
        }
    }

    // ---- input modes ----

    pub fn enter_command(&mut self) {
        self.input_mode = InputMode::Command;
        self.command.input.clear();
    }

    pub fn exit_command(&mut self) {
        self.input_mode = InputMode::Normal;
        self.command.input.clear();
    }

    pub fn enter_prompt(&mut self, kind: PromptKind, target: Option<u64>) {
        self.input_mode = InputMode::Prompt(kind);
        self.prompt_target = target;
        self.command.input.clear();
        if kind == PromptKind::Search {
            self.command.input = self.current().query.search.clone();
        }
    }

    pub fn exit_prompt(&mut self) {
        self.input_mode = InputMode::Normal;
        self.prompt_target = None;
        self.command.input.clear();
    }

    /// Title shown above the prompt input
    pub fn prompt_label(&self, kind: PromptKind) -> String {
        let target = self
            .prompt_target
            .and_then(|id| self.find_nft(id))
            .map(|nft| format!("#{} {}", nft.id, nft.name))
            .unwrap_or_default();
        match kind {
            PromptKind::Search => "Search name or description".to_string(),
            PromptKind::Offer => format!("Offer amount in APT for {}", target),
            PromptKind::Sell => format!("Sale price in APT for {}", target),
            PromptKind::Transfer => format!("Recipient address for {}", target),
            PromptKind::Tip => format!("Tip amount in APT for {}", target),
            PromptKind::ConfirmBuy => format!("Buy {}? (y/n)", target),
        }
    }

    pub fn apply_command(&mut self) {
        let input = self.command.input.trim().to_string();
        if input.is_empty() {
            self.exit_command();
            return;
        }
        self.exit_command();
        let cmd = crate::core::parse_command(&input);
        self.command.last = Some(input);
        let action = self.execute_command(&cmd);
        self.apply_action(action);
    }

    pub fn apply_prompt(&mut self, kind: PromptKind) {
        let input = self.command.input.trim().to_string();
        let target = self.prompt_target;
        self.exit_prompt();

        if kind == PromptKind::Search {
            self.set_search(&input);
            return;
        }
        let Some(nft_id) = target else {
            self.set_status("No NFT selected", StatusLevel::Warn);
            return;
        };
        match kind {
            PromptKind::Offer => self.submit_amount(nft_id, &input, |nft_id, octas| {
                EntryOperation::MakeOffer { nft_id, octas }
            }),
            PromptKind::Sell => self.submit_amount(nft_id, &input, |nft_id, octas| {
                EntryOperation::ListForSale { nft_id, octas }
            }),
            PromptKind::Tip => self.submit_amount(nft_id, &input, |nft_id, octas| {
                EntryOperation::Tip { nft_id, octas }
            }),
            PromptKind::Transfer => {
                self.submit(EntryOperation::Transfer {
                    nft_id,
                    recipient: input,
                });
            }
            PromptKind::ConfirmBuy => self.confirm_purchase(nft_id),
            PromptKind::Search => {}
        }
    }

    // ---- operations ----

    fn find_nft(&self, id: u64) -> Option<&Nft> {
        self.current().records.iter().find(|nft| nft.id == id)
    }

    fn submit_amount(
        &mut self,
        nft_id: u64,
        input: &str,
        build: impl FnOnce(u64, u64) -> EntryOperation,
    ) {
        match parse_amount(input) {
            Ok(octas) => {
                self.submit(build(nft_id, octas));
            }
            Err(err) => self.set_status(format!("Invalid amount: {}", err), StatusLevel::Error),
        }
    }

    /// Queue an operation unless it is invalid or already in flight
    pub fn submit(&mut self, op: EntryOperation) -> bool {
        let key = op.key();
        if self.pending_ops.contains_key(&key) {
            self.set_status(format!("{} is already in progress", key), StatusLevel::Warn);
            return false;
        }
        if let Err(err) = op.validate(&self.config) {
            self.set_status(format!("{}: {}", key, err), StatusLevel::Error);
            return false;
        }
        self.pending_ops.insert(key, self.screen);
        self.outbox.push(RuntimeCommand::Submit { op });
        self.set_status(
            format!("{}: waiting for wallet approval…", key),
            StatusLevel::Info,
        );
        true
    }

    fn selected_id_on(&mut self, screen: Screen, action: &str) -> Option<u64> {
        if self.screen != screen {
            self.set_status(
                format!("{} is only available on {}", action, screen.title()),
                StatusLevel::Warn,
            );
            return None;
        }
        self.selected_id(action)
    }

    fn selected_id(&mut self, action: &str) -> Option<u64> {
        let id = self.selected_nft().map(|nft| nft.id);
        if id.is_none() {
            self.set_status(format!("{}: no NFT selected", action), StatusLevel::Warn);
        }
        id
    }

    pub fn begin_purchase(&mut self) {
        let Some(id) = self.selected_id_on(Screen::Market, "Buy") else {
            return;
        };
        if self.find_nft(id).map(|nft| nft.for_sale) != Some(true) {
            self.set_status(format!("NFT #{} is not for sale", id), StatusLevel::Warn);
            return;
        }
        self.enter_prompt(PromptKind::ConfirmBuy, Some(id));
    }

    pub fn confirm_purchase(&mut self, nft_id: u64) {
        self.exit_prompt();
        let Some(nft) = self.find_nft(nft_id) else {
            self.set_status(format!("NFT #{} is no longer listed", nft_id), StatusLevel::Warn);
            return;
        };
        match nft.price_octas() {
            Ok(octas) => {
                self.submit(EntryOperation::Purchase { nft_id, octas });
            }
            Err(err) => self.set_status(format!("Invalid price: {}", err), StatusLevel::Error),
        }
    }

    pub fn begin_offer(&mut self, amount: Option<&str>) {
        let Some(id) = self.selected_id_on(Screen::Market, "Offer") else {
            return;
        };
        match amount {
            Some(amount) => self.submit_amount(id, amount, |nft_id, octas| {
                EntryOperation::MakeOffer { nft_id, octas }
            }),
            None => self.enter_prompt(PromptKind::Offer, Some(id)),
        }
    }

    pub fn begin_sell(&mut self, price: Option<&str>) {
        let Some(id) = self.selected_id_on(Screen::Collection, "List for sale") else {
            return;
        };
        match price {
            Some(price) => self.submit_amount(id, price, |nft_id, octas| {
                EntryOperation::ListForSale { nft_id, octas }
            }),
            None => self.enter_prompt(PromptKind::Sell, Some(id)),
        }
    }

    pub fn begin_transfer(&mut self, recipient: Option<&str>) {
        let Some(id) = self.selected_id_on(Screen::Collection, "Transfer") else {
            return;
        };
        match recipient {
            Some(recipient) => {
                self.submit(EntryOperation::Transfer {
                    nft_id: id,
                    recipient: recipient.to_string(),
                });
            }
            None => self.enter_prompt(PromptKind::Transfer, Some(id)),
        }
    }

    pub fn begin_tip(&mut self, amount: Option<&str>) {
        let Some(id) = self.selected_id("Tip") else {
            return;
        };
        match amount {
            Some(amount) => self.submit_amount(id, amount, |nft_id, octas| {
                EntryOperation::Tip { nft_id, octas }
            }),
            None => self.enter_prompt(PromptKind::Tip, Some(id)),
        }
    }

    pub fn like_selected(&mut self) {
        if let Some(nft_id) = self.selected_id("Like") {
            self.submit(EntryOperation::Like { nft_id });
        }
    }

    pub fn open_offers(&mut self) {
        let Some(id) = self.selected_id_on(Screen::Collection, "Offers") else {
            return;
        };
        let nft_name = self
            .find_nft(id)
            .map(|nft| nft.name.clone())
            .unwrap_or_default();
        self.offers = Some(OffersPanel {
            nft_id: id,
            nft_name,
            offers: Vec::new(),
            selected: 0,
            loading: true,
        });
        self.request_offers(id);
    }

    pub fn close_offers(&mut self) {
        self.offers = None;
    }

    /// Accept or decline the selected offer, or the one from `offerer`
    pub fn resolve_offer(&mut self, accept: bool, offerer: Option<&str>) {
        let Some(panel) = self.offers.as_ref() else {
            self.set_status("Open the offers panel first (o)", StatusLevel::Warn);
            return;
        };
        let offer = match offerer {
            Some(address) => {
                let wanted = address.trim().to_lowercase();
                panel.offers.iter().find(|offer| offer.key().offerer == wanted)
            }
            None => panel.selected_offer(),
        };
        let Some(key) = offer.map(Offer::key) else {
            self.set_status("No matching offer", StatusLevel::Warn);
            return;
        };
        let op = if accept {
            EntryOperation::AcceptOffer {
                nft_id: key.nft_id,
                offerer: key.offerer,
            }
        } else {
            EntryOperation::DeclineOffer {
                nft_id: key.nft_id,
                offerer: key.offerer,
            }
        };
        self.submit(op);
    }

    pub fn is_pending(&self, kind: OperationKind, nft_id: u64) -> bool {
        self.pending_ops.contains_key(&OperationKey { kind, nft_id })
    }

    // ---- command bar ----

    /// Execute a parsed command
    pub fn execute_command(&mut self, cmd: &Command) -> Action {
        match cmd {
            Command::Market => Action::Navigate(NavigateTarget::Market),
            Command::Collection => Action::Navigate(NavigateTarget::Collection),
            Command::Page(page) => Action::Navigate(NavigateTarget::Page(*page)),
            Command::NextPage => Action::Navigate(NavigateTarget::NextPage),
            Command::PrevPage => Action::Navigate(NavigateTarget::PrevPage),

            Command::Rarity(None) => {
                self.cycle_category();
                Action::None
            }
            Command::Rarity(Some(value)) => match CategoryFilter::parse(value) {
                Some(category) => {
                    self.set_category(category);
                    Action::Notify(format!("Rarity: {}", category.label()), NotifyLevel::Info)
                }
                None => Action::Notify(format!("Unknown rarity: {}", value), NotifyLevel::Warn),
            },
            Command::Sort(None) => {
                self.cycle_sort();
                Action::None
            }
            Command::Sort(Some(value)) => match SortKey::parse(value) {
                Some(sort) => {
                    self.set_sort(sort);
                    Action::Notify(format!("Sort: {}", sort.label()), NotifyLevel::Info)
                }
                None => Action::Notify(
                    format!("Unknown sort: {} (asc, desc, likes)", value),
                    NotifyLevel::Warn,
                ),
            },
            Command::Search(text) => {
                self.set_search(text.as_deref().unwrap_or(""));
                match text {
                    Some(text) => Action::Notify(format!("Search: {}", text), NotifyLevel::Info),
                    None => Action::Notify("Search cleared".into(), NotifyLevel::Info),
                }
            }

            Command::Buy => {
                self.begin_purchase();
                Action::None
            }
            Command::Offer(amount) => {
                self.begin_offer(amount.as_deref());
                Action::None
            }
            Command::Sell(price) => {
                self.begin_sell(price.as_deref());
                Action::None
            }
            Command::Transfer(recipient) => {
                self.begin_transfer(recipient.as_deref());
                Action::None
            }
            Command::Tip(amount) => {
                self.begin_tip(amount.as_deref());
                Action::None
            }
            Command::Like => {
                self.like_selected();
                Action::None
            }

            Command::Offers => {
                self.open_offers();
                Action::None
            }
            Command::Accept(offerer) => {
                self.resolve_offer(true, offerer.as_deref());
                Action::None
            }
            Command::Decline(offerer) => {
                self.resolve_offer(false, offerer.as_deref());
                Action::None
            }

            Command::Refresh => {
                self.refresh();
                Action::None
            }
            Command::Help => Action::ShowHelp,
            Command::Quit => Action::Quit,
            Command::Unknown(s) => Action::Notify(format!("Unknown command: {}", s), NotifyLevel::Warn),
        }
    }

    /// Apply an action returned by a command
    pub fn apply_action(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::Navigate(target) => match target {
                NavigateTarget::Market => self.switch_screen(Screen::Market),
                NavigateTarget::Collection => self.switch_screen(Screen::Collection),
                NavigateTarget::NextPage => self.next_page(),
                NavigateTarget::PrevPage => self.prev_page(),
                NavigateTarget::Page(page) => {
                    if !self.goto_page(page) {
                        let pages = self.current().page_count(self.page_size());
                        self.set_status(
                            format!("Page {} out of range (1-{})", page, pages.max(1)),
                            StatusLevel::Warn,
                        );
                    }
                }
            },
            Action::Notify(msg, level) => self.set_status(msg, level.into()),
            Action::ShowHelp => self.show_help = !self.show_help,
            Action::Quit => self.should_quit = true,
        }
    }
}
