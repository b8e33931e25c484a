use clap::Parser;
use nu_ansi_term::{Color, Style};

use crate::config::Config;
use crate::gateway::http::{ExploreClient, PlacesClient};
use crate::lookup::LookupDriver;
use crate::surface::{LogSurface, MemorySurface};
use crate::venue::NO_RATING;
use crate::view::ViewModel;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Neighborhood to look up, instead of the configured default
    #[arg(short, long)]
    neighborhood: Option<String>,
    /// Keyword to filter venues by name or category
    #[arg(short, long)]
    keyword: Option<String>,
    /// Layout width in px; narrow layouts engage the carousel
    #[arg(long)]
    width: Option<f32>,
}

impl Args {
    pub async fn run(&self, mut config: Config) -> miette::Result<()> {
        if let Some(neighborhood) = &self.neighborhood {
            config.default_neighborhood = neighborhood.clone();
        }
        let places = PlacesClient::new(&config.places)?;
        let venues = ExploreClient::new(&config.venues)?;
        let surface = LogSurface::new(MemorySurface::default());
        let (mut view, lookups) = ViewModel::new(surface, &config);
        let driver = tokio::spawn(LookupDriver::new(places, venues).run(lookups));

        if let Some(width) = self.width {
            view.set_layout_width(width);
        }
        while view.is_loading() {
            view.pump_async().await?;
        }
        if let Some(keyword) = &self.keyword {
            view.set_keyword(keyword.clone());
        }
        print_view(&view);

        drop(view);
        let _ = driver.await;
        Ok(())
    }
}

fn print_view(view: &ViewModel<LogSurface<MemorySurface>>) {
    let bold = Style::new().bold();
    let dim = Style::new().dimmed();
    println!(
        "{} {}",
        bold.paint(view.neighborhood()),
        dim.paint(match view.neighborhood_state().resolved_center {
            Some(center) => format!("({center})"),
            None => "(not found)".to_string(),
        })
    );
    if !view.keyword().is_empty() {
        println!("filter: {}", Color::Yellow.paint(view.keyword()));
    }
    let selected = view.selected_venue();
    for venue in view.filtered_list() {
        let rating = venue
            .rating
            .map(|r| format!("{r:.1}"))
            .unwrap_or_else(|| NO_RATING.to_string());
        let marker = if selected == Some(venue.id.as_str()) {
            Color::Green.paint("▶")
        } else {
            Style::new().paint(" ")
        };
        println!(
            "{marker} {} {} {}",
            bold.paint(&venue.name),
            dim.paint(venue.primary_category()),
            Color::Cyan.paint(rating)
        );
    }
    println!(
        "{} of {} venues shown, {} markers attached",
        view.filtered_len(),
        view.venues().len(),
        view.surface().inner.attached_count()
    );
    let carousel = view.carousel();
    if carousel.is_engaged() && !carousel.is_empty() {
        if let Some(index) = carousel.index() {
            println!(
                "carousel {}/{} {}{}",
                index + 1,
                carousel.len(),
                if view.can_swipe_left() { "◀" } else { " " },
                if view.can_swipe_right() { "▶" } else { " " },
            );
        }
    }
}
