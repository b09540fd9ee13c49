/*!
 * Integration tests for boards, questions, papers and playlists via the session
 */

use anyhow::Result;
use std::collections::HashSet;

use studyme::errors::DocumentError;
use studyme::views::View;
use studyme::{MarkPreferences, NewQuestion, StudySession};

use crate::common::{self, RecordingListener};

/// Test the documented quick-add example end to end
#[test]
fn test_quickAdd_withFullLine_shouldCreateQuestionSubjectAndChapter() -> Result<()> {
    let mut session = common::memory_session();
    let board = session.create_board("CBSE")?;
    session.select_board(Some(board))?;

    let ids = session.quick_add("5|Physics|Motion|2021|What is velocity?")?;
    assert_eq!(ids.len(), 1);

    let questions = session.questions()?;
    assert_eq!(questions.len(), 1);
    let q = &questions[0];
    assert_eq!(q.marks, 5);
    assert_eq!(q.year, Some(2021));
    assert_eq!(q.text, "What is velocity?");
    assert_eq!(q.board.as_deref(), Some("CBSE"));
    assert_eq!(q.subject.as_deref(), Some("Physics"));
    assert_eq!(q.chapter.as_deref(), Some("Motion"));

    let subjects = session.subjects(board)?;
    assert_eq!(subjects.len(), 1);
    assert_eq!(subjects[0].name, "Physics");
    assert_eq!(session.repository().list_chapters(subjects[0].id)?.len(), 1);
    Ok(())
}

/// Test the documented fallback example end to end
#[test]
fn test_quickAdd_withFallbackLine_shouldFileUnderGeneral() -> Result<()> {
    let mut session = common::memory_session();
    let board = session.create_board("ICSE")?;
    session.select_board(Some(board))?;

    session.quick_add("abc|  |  | |Just text")?;

    let q = &session.questions()?[0];
    assert_eq!(q.marks, 3);
    assert_eq!(q.subject.as_deref(), Some("General"));
    assert_eq!(q.chapter.as_deref(), Some("General"));
    assert!(q.year.is_none());
    assert_eq!(q.text, "Just text");
    Ok(())
}

/// Test quick-add with no active board
#[test]
fn test_quickAdd_withoutBoard_shouldInsertUnplacedQuestion() -> Result<()> {
    let mut session = common::memory_session();

    session.quick_add("2|Physics|Light|2022|Define refraction.")?;

    let stats = session.stats()?;
    assert_eq!(stats.questions, 1);
    assert_eq!(stats.subjects, 0);
    assert_eq!(stats.chapters, 0);

    let q = &session.questions()?[0];
    assert!(q.board.is_none());
    assert_eq!(q.marks, 2);
    Ok(())
}

/// Test that subjects resolve per board, not globally
#[test]
fn test_quickAdd_sameSubjectOnTwoBoards_shouldCreateTwoSubjects() -> Result<()> {
    let mut session = common::memory_session();
    let cbse = session.create_board("CBSE")?;
    let icse = session.create_board("ICSE")?;

    session.select_board(Some(cbse))?;
    session.quick_add("1|Physics|Motion||A")?;
    session.select_board(Some(icse))?;
    session.quick_add("1|Physics|Motion||B")?;

    assert_eq!(session.stats()?.subjects, 2);
    assert_eq!(session.subjects(cbse)?.len(), 1);
    assert_eq!(session.subjects(icse)?.len(), 1);
    Ok(())
}

/// Test the occurrence count for repeated text
#[test]
fn test_questions_withSameTextThreeTimes_shouldCountThreeOccurrences() -> Result<()> {
    let mut session = common::memory_session();

    session.quick_add("3||||What is inertia?")?;
    session.add_question(NewQuestion::new("What is inertia?"))?;
    session.quick_add("5|Physics|Laws|2015|What is inertia?")?;
    session.quick_add("3||||What is inertia ?")?;

    let questions = session.questions()?;
    let exact: Vec<_> = questions.iter().filter(|q| q.text == "What is inertia?").collect();
    assert_eq!(exact.len(), 3);
    assert!(exact.iter().all(|q| q.occurrences == 3));

    let near = questions.iter().find(|q| q.text == "What is inertia ?").unwrap();
    assert_eq!(near.occurrences, 1);
    assert_eq!(session.occurrences("What is inertia?")?, 3);
    Ok(())
}

/// Test that the question list follows the active board
#[test]
fn test_questions_withBoardSelection_shouldFilterByBoard() -> Result<()> {
    let (mut session, board) = common::seeded_session()?;
    let other = session.create_board("State")?;
    session.select_board(Some(other))?;
    session.quick_add("4|History|Wars||Describe the causes.")?;

    assert_eq!(session.questions()?.len(), 1);

    session.select_board(Some(board))?;
    assert_eq!(session.questions()?.len(), 4);

    session.select_board(None)?;
    assert_eq!(session.questions()?.len(), 5);
    Ok(())
}

/// Test that questions list newest first
#[test]
fn test_questions_shouldListNewestFirst() -> Result<()> {
    let (session, _) = common::seeded_session()?;

    let questions = session.questions()?;

    assert_eq!(questions[0].text, "Name a noble gas.");
    assert_eq!(questions[3].text, "What is velocity?");
    Ok(())
}

/// Test paper generation bounds through the session
#[test]
fn test_generatePaper_withCountAbovePool_shouldReturnEveryQuestionOnce() -> Result<()> {
    let (mut session, _) = common::seeded_session()?;

    let paper = session.generate_paper(100, &MarkPreferences::parse("5,3"))?;

    let ids: HashSet<i64> = paper.iter().map(|q| q.id).collect();
    assert_eq!(paper.len(), 4);
    assert_eq!(ids.len(), 4);

    let empty = session.generate_paper(0, &MarkPreferences::none())?;
    assert!(empty.is_empty());
    Ok(())
}

/// Test preference bias through the session with a seeded random source
#[test]
fn test_generatePaper_withPreferredMarks_shouldFavourThem() -> Result<()> {
    let mut session = StudySession::in_memory()?.with_seed(2024);
    let board = session.create_board("CBSE")?;
    session.select_board(Some(board))?;

    let mut block = String::from("5|||| The long answer");
    for i in 0..9 {
        block.push_str(&format!("\n1||||Short answer {}", i));
    }
    session.quick_add(&block)?;

    let prefs = MarkPreferences::parse("5");
    let trials = 2000;
    let mut hits = 0;
    for _ in 0..trials {
        let paper = session.generate_paper(1, &prefs)?;
        if paper[0].marks == 5 {
            hits += 1;
        }
    }

    // Uniform rate is 1/10
    let rate = hits as f64 / trials as f64;
    assert!(rate > 0.15, "preferred rate {} not above uniform", rate);
    Ok(())
}

/// Test the playlist lifecycle and cascade delete
#[test]
fn test_deletePlaylist_withItems_shouldRemoveAllItems() -> Result<()> {
    let (mut session, _) = common::seeded_session()?;
    let ids: Vec<i64> = session.questions()?.iter().map(|q| q.id).collect();

    let playlist = session.create_playlist("Revision")?;
    for id in &ids[..3] {
        session.add_to_playlist(playlist, *id)?;
    }
    assert_eq!(session.playlist_item_count(playlist)?, 3);
    assert_eq!(session.stats()?.playlist_items, 3);

    let removed = session.delete_playlist(playlist)?;

    assert_eq!(removed, 3);
    assert_eq!(session.playlist_item_count(playlist)?, 0);
    assert_eq!(session.stats()?.playlist_items, 0);
    assert!(session.playlists()?.is_empty());
    assert!(session.playlist_contents(playlist)?.is_empty());
    Ok(())
}

/// Test that the same question may be added twice and is removed in full
#[test]
fn test_playlist_withDuplicateItems_shouldKeepAndRemoveBoth() -> Result<()> {
    let (mut session, _) = common::seeded_session()?;
    let question = session.questions()?[0].id;
    let playlist = session.create_playlist("Repeats")?;

    session.add_to_playlist(playlist, question)?;
    session.add_to_playlist(playlist, question)?;
    assert_eq!(session.playlist_item_count(playlist)?, 2);
    assert_eq!(session.playlists()?[0].item_count, 2);

    let removed = session.remove_from_playlist(playlist, question)?;
    assert_eq!(removed, 2);
    assert_eq!(session.playlist_item_count(playlist)?, 0);

    assert_eq!(session.remove_from_playlist(playlist, question)?, 0);
    Ok(())
}

/// Test playlist contents order
#[test]
fn test_playlistContents_shouldShowMostRecentlyAddedFirst() -> Result<()> {
    let (mut session, _) = common::seeded_session()?;
    let questions = session.questions()?;
    let playlist = session.create_playlist("Order")?;

    session.add_to_playlist(playlist, questions[2].id)?;
    session.add_to_playlist(playlist, questions[0].id)?;

    let contents = session.playlist_contents(playlist)?;
    assert_eq!(contents[0].question_id, questions[0].id);
    assert_eq!(contents[1].question_id, questions[2].id);
    Ok(())
}

/// Test the featured playlist limit
#[test]
fn test_recentPlaylists_shouldRespectConfiguredLimit() -> Result<()> {
    let mut session = common::memory_session();
    for i in 0..10 {
        session.create_playlist(&format!("List {}", i))?;
    }

    let recent = session.recent_playlists()?;

    assert_eq!(recent.len(), 8);
    assert_eq!(recent[0].name, "List 9");
    Ok(())
}

/// Test that the playlists section of the config sets the recent list size
#[test]
fn test_recentPlaylists_withPlaylistsSection_shouldUseFeaturedCount() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut config = common::config_in(temp_dir.path());
    config.playlists.featured = 3;
    let mut session = StudySession::open(config)?;
    for i in 0..5 {
        session.create_playlist(&format!("List {}", i))?;
    }

    let recent = session.recent_playlists()?;

    let names: Vec<&str> = recent.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["List 4", "List 3", "List 2"]);
    assert_eq!(session.playlists()?.len(), 5);
    Ok(())
}

/// Test document ingestion under the active board
#[test]
fn test_ingestDocument_withActiveBoard_shouldUseBoardAndFixedMarks() -> Result<()> {
    let mut session = common::memory_session();
    let board = session.create_board("CBSE")?;
    session.select_board(Some(board))?;

    let doc = studyme::document::TextDocument::from_pages(["1. Define force.\n\n2. Define work.", "3. Define power."]);
    let ids = session.ingest_document(&doc)?;

    assert_eq!(ids.len(), 3);
    for q in session.questions()? {
        assert_eq!(q.marks, 3);
        assert_eq!(q.board.as_deref(), Some("CBSE"));
        assert!(q.subject.is_none());
        assert!(q.chapter.is_none());
        assert!(q.year.is_none());
    }
    Ok(())
}

/// Test ingestion of a file on disk
#[tokio::test]
async fn test_ingestFile_withTextFile_shouldInsertEachBlock() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "paper.txt", "Q one\n\nQ two\x0CQ three\n")?;
    let mut session = common::memory_session();

    let ids = session.ingest_file(&path).await?;

    assert_eq!(ids.len(), 3);
    assert_eq!(session.stats()?.questions, 3);
    Ok(())
}

/// Test that a file that is not UTF-8 text is refused without inserting anything
#[tokio::test]
async fn test_ingestFile_withInvalidUtf8_shouldFailAndInsertNothing() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("scan.txt");
    std::fs::write(&path, b"1. Define force.\n\n2. \xff\xfe\x00binary")?;
    let mut session = common::memory_session();

    let err = session.ingest_file(&path).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<DocumentError>(),
        Some(DocumentError::InvalidText { .. })
    ));
    assert_eq!(session.stats()?.questions, 0);
    Ok(())
}

/// Test that every mutation refreshes the views that show it
#[test]
fn test_mutations_shouldNotifyRefreshListener() -> Result<()> {
    let listener = RecordingListener::new();
    let mut session = common::memory_session().with_listener(Box::new(listener.clone()));

    let board = session.create_board("CBSE")?;
    assert_eq!(listener.seen(), vec![View::Boards]);

    listener.clear();
    session.select_board(Some(board))?;
    session.quick_add("1||||Q")?;
    assert_eq!(listener.seen(), vec![View::Questions, View::Questions]);

    listener.clear();
    let playlist = session.create_playlist("P")?;
    let question = session.questions()?[0].id;
    session.add_to_playlist(playlist, question)?;
    session.remove_from_playlist(playlist, question)?;
    session.delete_playlist(playlist)?;
    assert_eq!(listener.seen(), vec![View::Playlists; 4]);

    listener.clear();
    session.generate_paper(1, &MarkPreferences::none())?;
    assert_eq!(listener.seen(), vec![View::GeneratedPaper]);
    Ok(())
}

/// Test that failed mutations leave no refresh and no change
#[test]
fn test_addToPlaylist_withMissingRows_shouldFailWithoutChange() -> Result<()> {
    let listener = RecordingListener::new();
    let mut session = common::memory_session().with_listener(Box::new(listener.clone()));

    assert!(session.add_to_playlist(1, 1).is_err());
    assert!(listener.seen().is_empty());
    assert_eq!(session.stats()?.playlist_items, 0);
    Ok(())
}
