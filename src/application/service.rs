use chrono::NaiveDate;

use crate::domain::{
    Booking, Expense, Itinerary, Ledger, Location, LocationId, NewExpense, NewLocation,
    Participant, SettlementTransfer, TotalSpend, default_bookings, default_itinerary,
    default_participants, find_participant,
};
use crate::storage::Repository;

use super::{AppError, BalanceEntry, ExpenseSummary, TripConfig};

/// Application service providing high-level operations for the trip.
/// This is the only place trip state is mutated; every change is persisted
/// before the call returns.
pub struct TripService {
    repo: Repository,
    config: TripConfig,
    participants: Vec<Participant>,
}

impl TripService {
    /// Create a new trip service with the given repository and the default roster.
    pub fn new(repo: Repository, config: TripConfig) -> Self {
        Self {
            repo,
            config,
            participants: default_participants(),
        }
    }

    pub fn with_participants(mut self, participants: Vec<Participant>) -> Self {
        self.participants = participants;
        self
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str, config: TripConfig) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        tracing::info!(database = database_path, "Initialized trip database");
        Ok(Self::new(repo, config))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str, config: TripConfig) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo, config))
    }

    pub fn config(&self) -> &TripConfig {
        &self.config
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    // ========================
    // Participants
    // ========================

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Resolve a participant by id or name.
    pub fn get_participant(&self, key: &str) -> Result<&Participant, AppError> {
        find_participant(&self.participants, key)
            .ok_or_else(|| AppError::ParticipantNotFound(key.to_string()))
    }

    // ========================
    // Expenses
    // ========================

    /// Load the ledger, starting empty when nothing (valid) is stored.
    pub async fn load_ledger(&self) -> Result<Ledger, AppError> {
        let expenses = self.repo.load_expenses().await?.unwrap_or_default();
        Ok(Ledger::from_expenses(expenses))
    }

    /// Record a new expense.
    pub async fn add_expense(&self, new_expense: NewExpense) -> Result<Expense, AppError> {
        let mut ledger = self.load_ledger().await?;
        let expense = ledger.add_expense(new_expense, &self.participants)?.clone();
        self.repo.save_expenses(ledger.expenses()).await?;

        tracing::info!(
            id = %expense.id,
            amount = expense.amount,
            currency = %expense.currency,
            paid_by = %expense.paid_by_id,
            split = expense.participant_ids.len(),
            "Recorded expense"
        );
        Ok(expense)
    }

    /// List expenses, most recent first.
    pub async fn list_expenses(&self, limit: Option<usize>) -> Result<Vec<Expense>, AppError> {
        let ledger = self.load_ledger().await?;
        Ok(ledger
            .newest_first()
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    /// Expenses `participant_key` paid for or shares, most recent first.
    pub async fn list_expenses_involving(
        &self,
        participant_key: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Expense>, AppError> {
        let participant_id = self.get_participant(participant_key)?.id.clone();
        let ledger = self.load_ledger().await?;
        Ok(ledger
            .newest_first()
            .filter(|e| e.involves(&participant_id))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    pub async fn total_spend(&self) -> Result<TotalSpend, AppError> {
        let ledger = self.load_ledger().await?;
        Ok(ledger.total_spend(&self.config.rate))
    }

    pub async fn expense_summary(&self) -> Result<ExpenseSummary, AppError> {
        let ledger = self.load_ledger().await?;
        Ok(ExpenseSummary::build(
            ledger.expenses(),
            &self.participants,
            &self.config,
        )?)
    }

    /// Net balance per participant, in roster order.
    pub async fn balances(&self) -> Result<Vec<BalanceEntry>, AppError> {
        Ok(self.expense_summary().await?.balances)
    }

    /// Payments that would settle the group.
    pub async fn settlement(&self) -> Result<Vec<SettlementTransfer>, AppError> {
        Ok(self.expense_summary().await?.settlement)
    }

    // ========================
    // Itinerary
    // ========================

    /// Load the itinerary, falling back to the default plan.
    pub async fn load_itinerary(&self) -> Result<Itinerary, AppError> {
        Ok(match self.repo.load_itinerary().await? {
            Some(days) => Itinerary::new(days),
            None => default_itinerary(),
        })
    }

    /// Every stop of the trip as `(day_number, stop)`, in day then time order.
    pub async fn list_stops(&self) -> Result<Vec<(u32, Location)>, AppError> {
        let itinerary = self.load_itinerary().await?;
        Ok(itinerary
            .all_locations()
            .map(|(day, loc)| (day.day_number, loc.clone()))
            .collect())
    }

    async fn save_itinerary(&self, itinerary: &Itinerary) -> Result<(), AppError> {
        self.repo.save_itinerary(itinerary.days()).await?;
        Ok(())
    }

    /// Add the day after the last one, or start the trip at `start` when the
    /// itinerary is empty.
    pub async fn add_day(&self, start: Option<NaiveDate>) -> Result<(u32, NaiveDate), AppError> {
        let mut itinerary = self.load_itinerary().await?;
        let day = match start {
            Some(date) => itinerary.add_day_starting(date)?,
            None => itinerary.add_day()?,
        };
        let added = (day.day_number, day.date);
        self.save_itinerary(&itinerary).await?;

        tracing::info!(day = added.0, date = %added.1, "Added itinerary day");
        Ok(added)
    }

    pub async fn add_location(
        &self,
        day_number: u32,
        input: NewLocation,
    ) -> Result<Location, AppError> {
        let mut itinerary = self.load_itinerary().await?;
        let location = itinerary.add_location(day_number, input)?;
        self.save_itinerary(&itinerary).await?;

        tracing::info!(day = day_number, name = %location.name, time = %location.time, "Added stop");
        Ok(location)
    }

    pub async fn remove_location(
        &self,
        day_number: u32,
        location_id: LocationId,
    ) -> Result<Location, AppError> {
        let mut itinerary = self.load_itinerary().await?;
        let removed = itinerary.remove_location(day_number, location_id)?;
        self.save_itinerary(&itinerary).await?;

        tracing::info!(day = day_number, name = %removed.name, "Removed stop");
        Ok(removed)
    }

    // ========================
    // Bookings
    // ========================

    /// List bookings, falling back to the default reservations.
    pub async fn list_bookings(&self) -> Result<Vec<Booking>, AppError> {
        Ok(self
            .repo
            .load_bookings()
            .await?
            .unwrap_or_else(default_bookings))
    }

    pub async fn add_booking(&self, booking: Booking) -> Result<Booking, AppError> {
        if booking.title.trim().is_empty() {
            return Err(AppError::InvalidBooking("title is required".to_string()));
        }

        let mut bookings = self.list_bookings().await?;
        bookings.push(booking.clone());
        bookings.sort_by_key(|b| b.date);
        self.repo.save_bookings(&bookings).await?;

        tracing::info!(kind = %booking.kind, title = %booking.title, "Added booking");
        Ok(booking)
    }
}
