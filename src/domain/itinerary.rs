use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub type LocationId = Uuid;
pub type DayId = Uuid;

/// Central Busan, used when a stop is added without coordinates.
pub const BUSAN_CENTER: (f64, f64) = (35.1795, 129.0756);

/// A planned stop on a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub time: NaiveTime,
    pub lat: f64,
    pub lng: f64,
    pub description: Option<String>,
}

impl Location {
    pub fn new(name: impl Into<String>, time: NaiveTime, lat: f64, lng: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            time,
            lat,
            lng,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyItinerary {
    pub id: DayId,
    pub date: NaiveDate,
    pub day_number: u32,
    /// Always sorted by time
    pub locations: Vec<Location>,
}

impl DailyItinerary {
    pub fn new(day_number: u32, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            day_number,
            locations: Vec::new(),
        }
    }

    fn insert(&mut self, location: Location) {
        self.locations.push(location);
        // Stable, so stops at the same time keep insertion order
        self.locations.sort_by_key(|l| l.time);
    }
}

/// User input for a new stop.
#[derive(Debug, Clone, Default)]
pub struct NewLocation {
    pub name: String,
    /// "HH:MM"
    pub time: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub description: Option<String>,
}

/// The whole trip plan, one entry per day in day order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Itinerary {
    days: Vec<DailyItinerary>,
}

impl Itinerary {
    pub fn new(days: Vec<DailyItinerary>) -> Self {
        Self { days }
    }

    pub fn days(&self) -> &[DailyItinerary] {
        &self.days
    }

    pub fn into_days(self) -> Vec<DailyItinerary> {
        self.days
    }

    pub fn day(&self, day_number: u32) -> Option<&DailyItinerary> {
        self.days.iter().find(|d| d.day_number == day_number)
    }

    fn day_mut(&mut self, day_number: u32) -> Result<&mut DailyItinerary, ItineraryError> {
        self.days
            .iter_mut()
            .find(|d| d.day_number == day_number)
            .ok_or(ItineraryError::DayNotFound(day_number))
    }

    /// Append the day after the last planned one.
    pub fn add_day(&mut self) -> Result<&DailyItinerary, ItineraryError> {
        let last = self.days.last().ok_or(ItineraryError::NoStartDate)?;
        let next = DailyItinerary::new(last.day_number + 1, last.date + Duration::days(1));
        self.days.push(next);
        Ok(&self.days[self.days.len() - 1])
    }

    /// Append a day, starting the trip at `date` if nothing is planned yet.
    pub fn add_day_starting(&mut self, date: NaiveDate) -> Result<&DailyItinerary, ItineraryError> {
        if self.days.is_empty() {
            self.days.push(DailyItinerary::new(1, date));
            return Ok(&self.days[0]);
        }
        self.add_day()
    }

    /// Add a stop to a day, keeping the day's stops in time order.
    pub fn add_location(
        &mut self,
        day_number: u32,
        input: NewLocation,
    ) -> Result<Location, ItineraryError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(ItineraryError::EmptyName);
        }
        let time = parse_time(&input.time)?;

        let lat = input.lat.unwrap_or(BUSAN_CENTER.0);
        let lng = input.lng.unwrap_or(BUSAN_CENTER.1);
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(ItineraryError::InvalidCoordinates { lat, lng });
        }

        let mut location = Location::new(name, time, lat, lng);
        if let Some(description) = input.description.filter(|d| !d.trim().is_empty()) {
            location = location.with_description(description);
        }

        self.day_mut(day_number)?.insert(location.clone());
        Ok(location)
    }

    pub fn remove_location(
        &mut self,
        day_number: u32,
        location_id: LocationId,
    ) -> Result<Location, ItineraryError> {
        let day = self.day_mut(day_number)?;
        let index = day
            .locations
            .iter()
            .position(|l| l.id == location_id)
            .ok_or(ItineraryError::LocationNotFound(location_id))?;
        Ok(day.locations.remove(index))
    }

    /// Every stop of the trip, in day then time order.
    pub fn all_locations(&self) -> impl Iterator<Item = (&DailyItinerary, &Location)> {
        self.days
            .iter()
            .flat_map(|day| day.locations.iter().map(move |loc| (day, loc)))
    }
}

/// Parse "HH:MM" (an hour without leading zero is accepted).
pub fn parse_time(input: &str) -> Result<NaiveTime, ItineraryError> {
    NaiveTime::parse_from_str(input.trim(), "%H:%M")
        .map_err(|_| ItineraryError::InvalidTime(input.to_string()))
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ItineraryError {
    #[error("day {0} is not in the itinerary")]
    DayNotFound(u32),

    #[error("stop not found: {0}")]
    LocationNotFound(LocationId),

    #[error("the itinerary is empty; a start date is required")]
    NoStartDate,

    #[error("stop name is required")]
    EmptyName,

    #[error("time must be in HH:MM format, got '{0}'")]
    InvalidTime(String),

    #[error("invalid coordinates: {lat}, {lng}")]
    InvalidCoordinates { lat: f64, lng: f64 },
}

/// The plan a new trip starts with.
pub fn default_itinerary() -> Itinerary {
    fn stop(name: &str, hour: u32, lat: f64, lng: f64, description: Option<&str>) -> Location {
        let time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or_default();
        let location = Location::new(name, time, lat, lng);
        match description {
            Some(d) => location.with_description(d),
            None => location,
        }
    }

    let start = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap_or_default();

    let mut day1 = DailyItinerary::new(1, start);
    day1.locations = vec![
        stop("Gimhae International Airport", 10, 35.1795, 128.9382, None),
        stop("Haeundae Beach", 14, 35.1587, 129.1604, Some("Check-in and walk")),
        stop("The Bay 101", 19, 35.1557, 129.1524, Some("Dinner and night view")),
    ];

    let mut day2 = DailyItinerary::new(2, start + Duration::days(1));
    day2.locations = vec![
        stop("Gamcheon Culture Village", 10, 35.0975, 129.0106, None),
        stop("Jagalchi Market", 13, 35.0968, 129.0306, None),
        stop("Gwangalli Beach", 18, 35.1532, 129.1189, None),
    ];

    Itinerary::new(vec![day1, day2])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(name: &str, time: &str) -> NewLocation {
        NewLocation {
            name: name.into(),
            time: time.into(),
            ..Default::default()
        }
    }

    fn names(day: &DailyItinerary) -> Vec<&str> {
        day.locations.iter().map(|l| l.name.as_str()).collect()
    }

    #[test]
    fn test_default_itinerary() {
        let itinerary = default_itinerary();
        assert_eq!(itinerary.days().len(), 2);
        assert_eq!(itinerary.day(1).unwrap().locations.len(), 3);
        assert_eq!(itinerary.day(2).unwrap().date.to_string(), "2024-05-11");
    }

    #[test]
    fn test_add_day_follows_last_day() {
        let mut itinerary = default_itinerary();
        let day = itinerary.add_day().unwrap();
        assert_eq!(day.day_number, 3);
        assert_eq!(day.date.to_string(), "2024-05-12");
        assert!(day.locations.is_empty());
    }

    #[test]
    fn test_add_day_crosses_month_boundary() {
        let start = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();
        let mut itinerary = Itinerary::default();
        itinerary.add_day_starting(start).unwrap();
        let day = itinerary.add_day().unwrap();
        assert_eq!(day.date.to_string(), "2024-06-01");
    }

    #[test]
    fn test_add_day_to_empty_itinerary_needs_start() {
        let mut itinerary = Itinerary::default();
        assert_eq!(itinerary.add_day().unwrap_err(), ItineraryError::NoStartDate);
    }

    #[test]
    fn test_add_location_keeps_time_order() {
        let mut itinerary = default_itinerary();
        itinerary.add_location(1, stop("Lunch", "12:30")).unwrap();
        itinerary.add_location(1, stop("Breakfast", "8:00")).unwrap();

        assert_eq!(
            names(itinerary.day(1).unwrap()),
            vec![
                "Breakfast",
                "Gimhae International Airport",
                "Lunch",
                "Haeundae Beach",
                "The Bay 101"
            ]
        );
    }

    #[test]
    fn test_add_location_defaults_to_busan_center() {
        let mut itinerary = default_itinerary();
        let location = itinerary.add_location(2, stop("Somewhere", "15:00")).unwrap();
        assert_eq!((location.lat, location.lng), BUSAN_CENTER);
        assert!(location.description.is_none());
    }

    #[test]
    fn test_add_location_rejects_bad_input() {
        let mut itinerary = default_itinerary();
        assert_eq!(
            itinerary.add_location(1, stop(" ", "10:00")).unwrap_err(),
            ItineraryError::EmptyName
        );
        assert!(matches!(
            itinerary.add_location(1, stop("Cafe", "25:00")),
            Err(ItineraryError::InvalidTime(_))
        ));
        assert!(matches!(
            itinerary.add_location(1, stop("Cafe", "noon")),
            Err(ItineraryError::InvalidTime(_))
        ));
        assert_eq!(
            itinerary.add_location(9, stop("Cafe", "10:00")).unwrap_err(),
            ItineraryError::DayNotFound(9)
        );
        assert_eq!(itinerary.day(1).unwrap().locations.len(), 3);
    }

    #[test]
    fn test_remove_location() {
        let mut itinerary = default_itinerary();
        let target = itinerary.day(2).unwrap().locations[1].id;

        let removed = itinerary.remove_location(2, target).unwrap();
        assert_eq!(removed.name, "Jagalchi Market");
        assert_eq!(
            names(itinerary.day(2).unwrap()),
            vec!["Gamcheon Culture Village", "Gwangalli Beach"]
        );

        assert_eq!(
            itinerary.remove_location(2, target).unwrap_err(),
            ItineraryError::LocationNotFound(target)
        );
    }

    #[test]
    fn test_all_locations_in_order() {
        let itinerary = default_itinerary();
        let all: Vec<_> = itinerary.all_locations().map(|(d, l)| (d.day_number, l.time)).collect();
        assert_eq!(all.len(), 6);
        assert!(all.windows(2).all(|w| w[0] <= w[1]));
    }
}
